// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands `train`, `test` and `predict`
// and their flags. Each argument struct converts into the
// matching application-layer config via From, so the
// application layer never sees clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{builder::RangedU64ValueParser, Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    predict_use_case::PredictConfig,
    train_use_case::TrainConfig,
};
use crate::ml::{backbone::EfficientNetConfig, model::CardClassifierConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier on dataset/{train,valid}
    Train(TrainArgs),

    /// Evaluate a checkpoint on the test split
    Test(TestArgs),

    /// Classify image files or directories of images
    Predict(PredictArgs),
}

/// Architecture flags shared by every command. A checkpoint only
/// loads into the architecture it was trained with.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Number of output classes
    #[arg(long, default_value_t = 53)]
    pub num_classes: usize,

    /// Use the narrow two-stage backbone instead of EfficientNet-B0
    #[arg(long)]
    pub compact_backbone: bool,

    /// Train only the linear head
    #[arg(long)]
    pub freeze_backbone: bool,
}

impl ModelArgs {
    pub fn classifier(&self) -> CardClassifierConfig {
        let backbone = if self.compact_backbone {
            EfficientNetConfig::compact()
        } else {
            EfficientNetConfig::b0()
        };
        CardClassifierConfig::new()
            .with_num_classes(self.num_classes)
            .with_backbone(backbone)
            .with_freeze_backbone(self.freeze_backbone)
    }
}

fn at_least_one() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

// ─── train ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Root directory holding train/, valid/ and test/
    #[arg(long, default_value = "dataset")]
    pub data_dir: PathBuf,

    /// Checkpoint base path (.mpk.gz and .json are written)
    #[arg(long, default_value = "playing_card_classifier")]
    pub checkpoint: PathBuf,

    /// Directory for metrics.csv and plots
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32, value_parser = at_least_one())]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for the training shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Square input size in pixels
    #[arg(long, default_value_t = 128, value_parser = at_least_one())]
    pub image_size: usize,

    /// Burn record with pretrained backbone weights
    #[arg(long)]
    pub pretrained: Option<PathBuf>,

    /// Skip writing loss_curve.png
    #[arg(long)]
    pub no_plot: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            classifier:   a.model.classifier(),
            data_dir:     a.data_dir,
            checkpoint:   a.checkpoint,
            artifact_dir: a.artifact_dir,
            epochs:       a.epochs,
            batch_size:   a.batch_size,
            lr:           a.lr,
            seed:         a.seed,
            image_size:   a.image_size,
            pretrained:   a.pretrained,
            plot:         !a.no_plot,
        }
    }
}

// ─── test ─────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Directory with one subdirectory per class
    #[arg(long, default_value = "dataset/test")]
    pub test_dir: PathBuf,

    #[arg(long, default_value = "playing_card_classifier")]
    pub checkpoint: PathBuf,

    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Render every misclassified sample to the artifact directory
    #[arg(long)]
    pub visualize_wrong: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl From<TestArgs> for EvaluateConfig {
    fn from(a: TestArgs) -> Self {
        EvaluateConfig {
            classifier:      a.model.classifier(),
            test_dir:        a.test_dir,
            checkpoint:      a.checkpoint,
            artifact_dir:    a.artifact_dir,
            visualize_wrong: a.visualize_wrong,
        }
    }
}

// ─── predict ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image files and/or directories of images
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, default_value = "playing_card_classifier")]
    pub checkpoint: PathBuf,

    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Write prediction_<name>.png for every input
    #[arg(long)]
    pub visualize: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl From<&PredictArgs> for PredictConfig {
    fn from(a: &PredictArgs) -> Self {
        PredictConfig {
            classifier:   a.model.classifier(),
            checkpoint:   a.checkpoint.clone(),
            artifact_dir: a.artifact_dir.clone(),
            visualize:    a.visualize,
        }
    }
}
