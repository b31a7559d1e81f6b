// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Open train/valid/test splits  (Layer 4 - data)
//   Step 2: Build the classifier          (Layer 5 - ml, Layer 6 - infra)
//   Step 3: Run the training loop         (Layer 5 - ml)
//   Step 4: Save checkpoint + model card  (Layer 6 - infra)
//   Step 5: Log metrics, plot loss curve  (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::DatasetSplits,
    transform::{ImageTransform, IMAGE_SIZE},
};
use crate::domain::{
    history::TrainingHistory,
    traits::{NullVisualizer, ResultVisualizer},
};
use crate::infra::{
    backbone_store::load_or_init,
    checkpoint::{CheckpointManager, ModelCard},
    metrics::MetricsLogger,
    plot::PlotRenderer,
};
use crate::ml::{
    model::CardClassifierConfig,
    trainer::{run_training, LoopSettings},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so a run can be described in (and reloaded from) JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Root holding train/, valid/ and test/
    pub data_dir:     PathBuf,
    /// Checkpoint base path; `.mpk.gz` and `.json` are appended
    pub checkpoint:   PathBuf,
    /// Where metrics.csv and plots go
    pub artifact_dir: PathBuf,
    pub epochs:       usize,
    pub batch_size:   usize,
    pub lr:           f64,
    pub seed:         u64,
    pub image_size:   usize,
    pub classifier:   CardClassifierConfig,
    /// Burn record of pretrained backbone weights
    pub pretrained:   Option<PathBuf>,
    pub plot:         bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:     PathBuf::from("dataset"),
            checkpoint:   PathBuf::from("playing_card_classifier"),
            artifact_dir: PathBuf::from("artifacts"),
            epochs:       5,
            batch_size:   32,
            lr:           1e-3,
            seed:         42,
            image_size:   IMAGE_SIZE,
            classifier:   CardClassifierConfig::new(),
            pretrained:   None,
            plot:         true,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:     TrainConfig,
    visualizer: Box<dyn ResultVisualizer>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        let visualizer: Box<dyn ResultVisualizer> = if config.plot {
            Box::new(PlotRenderer::new(&config.artifact_dir))
        } else {
            Box::new(NullVisualizer)
        };
        Self { config, visualizer }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train on backend `B`, write the checkpoint, and return the
    /// per-epoch losses.
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainingHistory> {
        let cfg = &self.config;

        // ── Step 1: Datasets ──────────────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.data_dir.display());
        let splits = DatasetSplits::load(&cfg.data_dir, ImageTransform::new(cfg.image_size))
            .with_context(|| format!("Cannot open dataset at '{}'", cfg.data_dir.display()))?;
        let vocab = splits.vocabulary();

        if vocab.len() != cfg.classifier.num_classes {
            bail!(
                "Dataset has {} classes but the classifier is configured for {}",
                vocab.len(),
                cfg.classifier.num_classes
            );
        }

        // ── Step 2: Classifier ────────────────────────────────────────────────
        let backbone = load_or_init::<B>(cfg.pretrained.as_deref(), &cfg.classifier.backbone, device)
            .context("Cannot load pretrained backbone")?;
        let model = cfg.classifier.init_with_backbone(backbone, device);
        tracing::info!(
            "Model ready: {}{}",
            cfg.classifier.describe(),
            if cfg.classifier.freeze_backbone { " (backbone frozen)" } else { "" }
        );

        // ── Step 3: Training loop ─────────────────────────────────────────────
        let settings = LoopSettings {
            epochs:        cfg.epochs,
            batch_size:    cfg.batch_size,
            learning_rate: cfg.lr,
            seed:          cfg.seed,
        };
        let (model, history) = run_training(&settings, model, &splits.train, &splits.valid, device)?;

        // ── Step 4: Checkpoint ────────────────────────────────────────────────
        let card = ModelCard::new(&cfg.classifier, vocab, cfg.image_size);
        CheckpointManager::new(&cfg.checkpoint)
            .save_model(&model, &card)
            .context("Cannot save checkpoint")?;

        // ── Step 5: Metrics and plot ──────────────────────────────────────────
        MetricsLogger::new(&cfg.artifact_dir)?.log_history(&history)?;
        if let Err(e) = self.visualizer.render_loss_curve(&history) {
            tracing::warn!("Cannot render loss curve: {e:#}");
        }

        tracing::info!("Training complete!");
        Ok(history)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::backbone::EfficientNetConfig;
    use crate::test_support::write_card_fixture;
    use burn::backend::{Autodiff, NdArray};

    type TrainBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_defaults() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.epochs, 5);
        assert_eq!(cfg.batch_size, 32);
        assert!((cfg.lr - 0.001).abs() < f64::EPSILON);
        assert_eq!(cfg.image_size, 128);
        assert_eq!(cfg.classifier.num_classes, 53);
    }

    #[test]
    fn test_class_count_must_match_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        write_card_fixture(tmp.path(), &["ace_of_spades", "joker"], 1);

        let cfg = TrainConfig {
            data_dir:     tmp.path().to_path_buf(),
            checkpoint:   tmp.path().join("model"),
            artifact_dir: tmp.path().join("artifacts"),
            image_size:   32,
            classifier:   CardClassifierConfig::new().with_backbone(EfficientNetConfig::compact()),
            plot:         false,
            ..TrainConfig::default()
        };

        let err = TrainUseCase::new(cfg).execute::<TrainBackend>(&Default::default()).unwrap_err();
        assert!(err.to_string().contains("2 classes"));
        assert!(!tmp.path().join("model.mpk.gz").exists());
    }

    #[test]
    fn test_run_writes_checkpoint_and_metrics() {
        let tmp = tempfile::tempdir().unwrap();
        write_card_fixture(tmp.path(), &["ace_of_spades", "joker"], 2);

        let cfg = TrainConfig {
            data_dir:     tmp.path().to_path_buf(),
            checkpoint:   tmp.path().join("model"),
            artifact_dir: tmp.path().join("artifacts"),
            epochs:       2,
            batch_size:   2,
            image_size:   32,
            classifier:   CardClassifierConfig::new()
                .with_num_classes(2)
                .with_backbone(EfficientNetConfig::compact()),
            plot:         false,
            ..TrainConfig::default()
        };

        let history = TrainUseCase::new(cfg).execute::<TrainBackend>(&Default::default()).unwrap();
        assert_eq!(history.len(), 2);

        assert!(tmp.path().join("model.mpk.gz").is_file());
        let card = CheckpointManager::new(tmp.path().join("model")).load_card().unwrap();
        assert_eq!(card.class_names, vec!["ace_of_spades", "joker"]);
        assert_eq!(card.image_size, 32);

        let csv = std::fs::read_to_string(tmp.path().join("artifacts/metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
