// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Classifies external images with a trained checkpoint.
//
// The checkpoint is restored once in `new` and reused for every
// input; `predict_image` is the one-shot form that restores it
// per call.

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::loader::collect_inputs;
use crate::domain::{
    prediction::Prediction,
    traits::{NullVisualizer, ResultVisualizer},
};
use crate::infra::{checkpoint::CheckpointManager, plot::PlotRenderer};
use crate::ml::{inferencer::Inferencer, model::CardClassifierConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    pub checkpoint:   PathBuf,
    pub artifact_dir: PathBuf,
    pub classifier:   CardClassifierConfig,
    pub visualize:    bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            checkpoint:   PathBuf::from("playing_card_classifier"),
            artifact_dir: PathBuf::from("artifacts"),
            classifier:   CardClassifierConfig::new(),
            visualize:    false,
        }
    }
}

pub struct PredictUseCase<B: Backend> {
    inferencer: Inferencer<B>,
    visualizer: Box<dyn ResultVisualizer>,
}

impl<B: Backend> PredictUseCase<B> {
    pub fn new(config: &PredictConfig, device: &B::Device) -> Result<Self> {
        let ckpt       = CheckpointManager::new(&config.checkpoint);
        let inferencer = Inferencer::from_checkpoint(&ckpt, &config.classifier, device)
            .with_context(|| format!("Cannot restore checkpoint '{}'", config.checkpoint.display()))?;

        let visualizer: Box<dyn ResultVisualizer> = if config.visualize {
            Box::new(PlotRenderer::new(&config.artifact_dir))
        } else {
            Box::new(NullVisualizer)
        };
        Ok(Self { inferencer, visualizer })
    }

    /// Classify one image file.
    pub fn predict(&self, path: &Path) -> Result<Prediction> {
        let (prediction, original) = self
            .inferencer
            .predict_path(path)
            .with_context(|| format!("Cannot classify '{}'", path.display()))?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
        if let Err(e) = self.visualizer.render_prediction(
            &format!("prediction_{stem}"),
            &original,
            &prediction.probabilities,
            self.inferencer.vocabulary().names(),
        ) {
            tracing::warn!("Cannot render prediction for '{}': {e:#}", path.display());
        }
        Ok(prediction)
    }

    /// Classify every file in `inputs`; directories contribute their
    /// image files in sorted order. One result per image, in order.
    pub fn predict_all(&self, inputs: &[PathBuf]) -> Result<Vec<(PathBuf, Prediction)>> {
        let files = collect_inputs(inputs)?;
        tracing::info!("Classifying {} image(s)", files.len());

        files
            .into_iter()
            .map(|path| {
                let prediction = self.predict(&path)?;
                Ok((path, prediction))
            })
            .collect()
    }
}

/// Restore the checkpoint and classify a single image.
pub fn predict_image<B: Backend>(
    config: &PredictConfig,
    path:   &Path,
    device: &B::Device,
) -> Result<Prediction> {
    PredictUseCase::<B>::new(config, device)?.predict(path)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
// End-to-end: train on a fixture dataset, then restore and predict.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::domain::error::CheckpointError;
    use crate::ml::backbone::EfficientNetConfig;
    use crate::test_support::write_card_fixture;
    use burn::backend::{Autodiff, NdArray};

    type InferBackend = NdArray<f32>;
    type TrainBackend = Autodiff<InferBackend>;

    fn classifier() -> CardClassifierConfig {
        CardClassifierConfig::new()
            .with_num_classes(2)
            .with_backbone(EfficientNetConfig::compact())
    }

    /// Train one epoch on a 2-class fixture with one image per class per split.
    fn trained(root: &Path) -> PredictConfig {
        write_card_fixture(root, &["joker", "ace_of_spades"], 1);
        let train = TrainConfig {
            data_dir:     root.to_path_buf(),
            checkpoint:   root.join("ckpt/model"),
            artifact_dir: root.join("artifacts"),
            epochs:       1,
            image_size:   32,
            classifier:   classifier(),
            plot:         false,
            ..TrainConfig::default()
        };
        TrainUseCase::new(train).execute::<TrainBackend>(&Default::default()).unwrap();

        PredictConfig {
            checkpoint:   root.join("ckpt/model"),
            artifact_dir: root.join("artifacts"),
            classifier:   classifier(),
            visualize:    false,
        }
    }

    #[test]
    fn test_trained_checkpoint_predicts_distributions() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = trained(tmp.path());
        assert!(tmp.path().join("ckpt/model.mpk.gz").is_file());

        let device   = Default::default();
        let use_case = PredictUseCase::<InferBackend>::new(&cfg, &device).unwrap();
        for class in ["joker", "ace_of_spades"] {
            let pred = use_case.predict(&tmp.path().join("train").join(class).join("0.png")).unwrap();

            assert!(pred.probabilities.iter().all(|&p| p >= 0.0));
            let total: f32 = pred.probabilities.iter().map(|p| p * 100.0).sum();
            assert!((total - 100.0).abs() < 1e-3, "total {total}");
            assert!(pred.confidence >= 50.0 && pred.confidence <= 100.0);
            assert!(pred.label == "joker" || pred.label == "ace_of_spades");
        }
    }

    #[test]
    fn test_batch_returns_one_result_per_input_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = trained(tmp.path());

        let inputs = vec![
            tmp.path().join("test/joker/0.png"),
            tmp.path().join("valid/ace_of_spades/0.png"),
            tmp.path().join("train/joker/0.png"),
        ];
        let use_case = PredictUseCase::<InferBackend>::new(&cfg, &Default::default()).unwrap();
        let results  = use_case.predict_all(&inputs).unwrap();

        assert_eq!(results.len(), inputs.len());
        let paths: Vec<PathBuf> = results.into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, inputs);
    }

    #[test]
    fn test_one_shot_matches_reused_model() {
        let tmp    = tempfile::tempdir().unwrap();
        let cfg    = trained(tmp.path());
        let image  = tmp.path().join("test/ace_of_spades/0.png");
        let device = Default::default();

        let once   = predict_image::<InferBackend>(&cfg, &image, &device).unwrap();
        let reused = PredictUseCase::<InferBackend>::new(&cfg, &device).unwrap().predict(&image).unwrap();
        assert_eq!(once.class_index, reused.class_index);
        assert!((once.confidence - reused.confidence).abs() < 1e-4);
    }

    #[test]
    fn test_missing_checkpoint_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = PredictConfig {
            checkpoint: tmp.path().join("nothing"),
            classifier: classifier(),
            ..PredictConfig::default()
        };
        let err = PredictUseCase::<InferBackend>::new(&cfg, &Default::default()).err().unwrap();
        let missing = err
            .chain()
            .filter_map(|c| c.downcast_ref::<CheckpointError>())
            .any(|e| matches!(e, CheckpointError::Missing(_)));
        assert!(missing, "{err:#}");
    }
}
