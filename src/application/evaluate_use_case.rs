// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
//   Step 1: Restore classifier + vocabulary from the checkpoint
//   Step 2: Open the test split against that vocabulary
//   Step 3: Score every sample, optionally render the misses

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::dataset::CardDataset;
use crate::domain::{
    prediction::EvaluationReport,
    traits::{NullVisualizer, ResultVisualizer},
};
use crate::infra::{checkpoint::CheckpointManager, plot::PlotRenderer};
use crate::ml::{evaluator::evaluate, inferencer::Inferencer, model::CardClassifierConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateConfig {
    /// Directory whose class subdirectories hold the test images
    pub test_dir:        PathBuf,
    pub checkpoint:      PathBuf,
    pub artifact_dir:    PathBuf,
    pub classifier:      CardClassifierConfig,
    pub visualize_wrong: bool,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            test_dir:        PathBuf::from("dataset/test"),
            checkpoint:      PathBuf::from("playing_card_classifier"),
            artifact_dir:    PathBuf::from("artifacts"),
            classifier:      CardClassifierConfig::new(),
            visualize_wrong: false,
        }
    }
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<EvaluationReport> {
        let cfg = &self.config;

        let ckpt       = CheckpointManager::new(&cfg.checkpoint);
        let inferencer = Inferencer::<B>::from_checkpoint(&ckpt, &cfg.classifier, device)
            .with_context(|| format!("Cannot restore checkpoint '{}'", cfg.checkpoint.display()))?;

        let test = CardDataset::open("test", &cfg.test_dir, inferencer.vocabulary(), inferencer.transform())
            .with_context(|| format!("Cannot open test split '{}'", cfg.test_dir.display()))?;

        let visualizer: Box<dyn ResultVisualizer> = if cfg.visualize_wrong {
            Box::new(PlotRenderer::new(&cfg.artifact_dir))
        } else {
            Box::new(NullVisualizer)
        };

        evaluate(&inferencer, &test, visualizer.as_ref(), cfg.visualize_wrong)
    }
}
