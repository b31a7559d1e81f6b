// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// A checkpoint is two files sharing one base path:
//
//   playing_card_classifier.mpk.gz   ← all classifier parameters
//   playing_card_classifier.json     ← model card
//
// The model card records the architecture, the class vocabulary
// and the input size. Loading refuses a checkpoint whose card
// describes a different architecture than the classifier it is
// loaded into, and prediction takes its label names from the card.
//
// Weights use NamedMpkGzFileRecorder at full precision so a
// save/load round trip reproduces predictions exactly.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{class_vocab::ClassVocabulary, error::CheckpointError};
use crate::ml::model::{CardClassifier, CardClassifierConfig};

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Metadata written next to the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    pub classifier:    CardClassifierConfig,
    pub class_names:   Vec<String>,
    pub image_size:    usize,
    pub crate_version: String,
}

impl ModelCard {
    pub fn new(classifier: &CardClassifierConfig, vocab: &ClassVocabulary, image_size: usize) -> Self {
        Self {
            classifier:    classifier.clone(),
            class_names:   vocab.names().to_vec(),
            image_size,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn vocabulary(&self) -> ClassVocabulary {
        ClassVocabulary::new(self.class_names.iter().cloned())
    }
}

pub struct CheckpointManager {
    /// Base path; both files append a suffix to its full file name
    base: PathBuf,
}

impl CheckpointManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn weights_path(&self) -> PathBuf {
        with_suffix(&self.base, ".mpk.gz")
    }

    pub fn card_path(&self) -> PathBuf {
        with_suffix(&self.base, ".json")
    }

    /// Path handed to the recorder. The recorder swaps the last
    /// extension for `mpk.gz`, so give it a throwaway one.
    fn recorder_path(&self) -> PathBuf {
        with_suffix(&self.base, ".mpk")
    }

    /// Write weights and card, replacing any previous checkpoint.
    pub fn save_model<B: Backend>(
        &self,
        model: &CardClassifier<B>,
        card:  &ModelCard,
    ) -> Result<(), CheckpointError> {
        if let Some(parent) = self.base.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        WeightsRecorder::new()
            .record(model.clone().into_record(), self.recorder_path())
            .map_err(|e| CheckpointError::Record {
                path:    self.weights_path(),
                message: format!("{e:?}"),
            })?;

        let card_path = self.card_path();
        let json = serde_json::to_string_pretty(card).map_err(|source| CheckpointError::ModelCard {
            path: card_path.clone(),
            source,
        })?;
        fs::write(&card_path, json).map_err(|source| CheckpointError::Io {
            path: card_path.clone(),
            source,
        })?;

        tracing::info!("Saved checkpoint to '{}'", self.weights_path().display());
        Ok(())
    }

    pub fn load_card(&self) -> Result<ModelCard, CheckpointError> {
        let path = self.card_path();
        let json = read_existing(&path)?;
        serde_json::from_str(&json).map_err(|source| CheckpointError::ModelCard { path, source })
    }

    /// Restore parameters into `model`, which must have been built
    /// from `expected`. Returns the model and its card.
    pub fn load_model<B: Backend>(
        &self,
        model:    CardClassifier<B>,
        expected: &CardClassifierConfig,
        device:   &B::Device,
    ) -> Result<(CardClassifier<B>, ModelCard), CheckpointError> {
        let card = self.load_card()?;
        if !expected.same_architecture(&card.classifier) {
            return Err(CheckpointError::ArchitectureMismatch {
                expected: expected.describe(),
                found:    card.classifier.describe(),
            });
        }
        if card.class_names.len() != card.classifier.num_classes {
            return Err(CheckpointError::ArchitectureMismatch {
                expected: format!("{} class names", card.classifier.num_classes),
                found:    format!("{} class names", card.class_names.len()),
            });
        }

        let weights = self.weights_path();
        if !weights.is_file() {
            return Err(CheckpointError::Missing(weights));
        }

        let record = WeightsRecorder::new()
            .load(self.recorder_path(), device)
            .map_err(|e| CheckpointError::Record {
                path:    weights.clone(),
                message: format!("{e:?}"),
            })?;

        tracing::info!("Loaded checkpoint '{}'", weights.display());
        Ok((model.load_record(record), card))
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_existing(path: &Path) -> Result<String, CheckpointError> {
    if !path.is_file() {
        return Err(CheckpointError::Missing(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::backbone::EfficientNetConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn compact(num_classes: usize) -> CardClassifierConfig {
        CardClassifierConfig::new()
            .with_num_classes(num_classes)
            .with_backbone(EfficientNetConfig::compact())
    }

    fn logits(model: &CardClassifier<TestBackend>, device: &<TestBackend as Backend>::Device) -> Vec<f32> {
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], device) * 0.5;
        model.forward(input).into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_predictions() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg    = compact(2);
        let vocab  = ClassVocabulary::new(["ace_of_spades", "joker"]);
        let ckpt   = CheckpointManager::new(tmp.path().join("model"));

        let original = cfg.init::<TestBackend>(&device);
        ckpt.save_model(&original, &ModelCard::new(&cfg, &vocab, 128)).unwrap();
        assert!(ckpt.weights_path().is_file());
        assert!(ckpt.card_path().is_file());

        let (restored, card) = ckpt.load_model(cfg.init::<TestBackend>(&device), &cfg, &device).unwrap();
        assert_eq!(card.vocabulary(), vocab);
        assert_eq!(card.image_size, 128);

        let before = logits(&original, &device);
        let after  = logits(&restored, &device);
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_missing_checkpoint() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg    = compact(2);
        let ckpt   = CheckpointManager::new(tmp.path().join("absent"));

        let err = ckpt.load_model(cfg.init::<TestBackend>(&device), &cfg, &device).unwrap_err();
        assert!(matches!(err, CheckpointError::Missing(_)));
    }

    #[test]
    fn test_architecture_mismatch_is_rejected() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let saved  = compact(2);
        let vocab  = ClassVocabulary::new(["ace_of_spades", "joker"]);
        let ckpt   = CheckpointManager::new(tmp.path().join("model"));
        ckpt.save_model(&saved.init::<TestBackend>(&device), &ModelCard::new(&saved, &vocab, 128))
            .unwrap();

        let wanted = compact(53);
        let err = ckpt.load_model(wanted.init::<TestBackend>(&device), &wanted, &device).unwrap_err();
        assert!(matches!(err, CheckpointError::ArchitectureMismatch { .. }));
    }

    #[test]
    fn test_dotted_base_names_do_not_collide() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let small  = compact(2);
        let large  = compact(3);
        let v2     = CheckpointManager::new(tmp.path().join("model.v2"));
        let v3     = CheckpointManager::new(tmp.path().join("model.v3"));
        assert_eq!(v2.weights_path(), tmp.path().join("model.v2.mpk.gz"));
        assert_eq!(v3.card_path(), tmp.path().join("model.v3.json"));

        v2.save_model(
            &small.init::<TestBackend>(&device),
            &ModelCard::new(&small, &ClassVocabulary::new(["a", "b"]), 64),
        )
        .unwrap();
        v3.save_model(
            &large.init::<TestBackend>(&device),
            &ModelCard::new(&large, &ClassVocabulary::new(["a", "b", "c"]), 64),
        )
        .unwrap();
        assert!(v2.weights_path().is_file());
        assert!(v3.weights_path().is_file());

        let (_, card) = v2.load_model(small.init::<TestBackend>(&device), &small, &device).unwrap();
        assert_eq!(card.class_names, ["a", "b"]);
        let (_, card) = v3.load_model(large.init::<TestBackend>(&device), &large, &device).unwrap();
        assert_eq!(card.class_names, ["a", "b", "c"]);
    }
}
