// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All work is delegated to Layer 2 (application).
//
//   train    fine-tune the classifier, write a checkpoint
//   test     evaluate a checkpoint on the test split
//   predict  classify images with a checkpoint
//
// The compute device is resolved here, once, and the matching
// Burn backend is chosen for the use case.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TestArgs, TrainArgs};

use crate::infra::device::{
    ComputeDevice, CpuBackend, CpuTrainBackend, DevicePreference, GpuBackend, GpuTrainBackend,
};

#[derive(Parser, Debug)]
#[command(
    name = "card-classifier",
    version,
    about = "Fine-tune an EfficientNet to recognise the 53 playing cards, then evaluate and predict."
)]
pub struct Cli {
    /// Compute device: auto picks a GPU when one is detected
    #[arg(long, value_enum, global = true, default_value_t = DevicePreference::Auto, env = "CARD_CLASSIFIER_DEVICE")]
    pub device: DevicePreference,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Resolve the device, then dispatch to the use case.
    pub fn run(self) -> Result<()> {
        let device = ComputeDevice::resolve(self.device);
        match self.command {
            Commands::Train(args)   => run_train(args, &device),
            Commands::Test(args)    => run_test(args, &device),
            Commands::Predict(args) => run_predict(&args, &device),
        }
    }
}

fn run_train(args: TrainArgs, device: &ComputeDevice) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on images in: {}", args.data_dir.display());
    let use_case = TrainUseCase::new(args.into());

    let history = match device {
        ComputeDevice::Cpu(d) => use_case.execute::<CpuTrainBackend>(d)?,
        ComputeDevice::Gpu(d) => use_case.execute::<GpuTrainBackend>(d)?,
    };

    if let Some(best) = history.best_epoch() {
        println!("Best epoch: {} (val loss {:.4})", best.epoch, best.val_loss);
    }
    println!(
        "Training complete. Checkpoint saved to '{}'.",
        use_case.config().checkpoint.display()
    );
    Ok(())
}

fn run_test(args: TestArgs, device: &ComputeDevice) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.into());
    let report = match device {
        ComputeDevice::Cpu(d) => use_case.execute::<CpuBackend>(d)?,
        ComputeDevice::Gpu(d) => use_case.execute::<GpuBackend>(d)?,
    };
    println!("{report}");
    Ok(())
}

fn run_predict(args: &PredictArgs, device: &ComputeDevice) -> Result<()> {
    use crate::application::predict_use_case::{PredictConfig, PredictUseCase};

    let config: PredictConfig = args.into();
    let results = match device {
        ComputeDevice::Cpu(d) => PredictUseCase::<CpuBackend>::new(&config, d)?.predict_all(&args.inputs)?,
        ComputeDevice::Gpu(d) => PredictUseCase::<GpuBackend>::new(&config, d)?.predict_all(&args.inputs)?,
    };

    let single = results.len() == 1;
    for (path, prediction) in results {
        if single {
            println!("{prediction}");
        } else {
            println!("{}: {prediction}", path.display());
        }
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["card-classifier", "--device", "cpu", "train"]).unwrap();
        assert_eq!(cli.device, DevicePreference::Cpu);

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 5);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.classifier.num_classes, 53);
        assert!(cfg.plot);
    }

    #[test]
    fn test_predict_keeps_input_order() {
        let cli = Cli::try_parse_from([
            "card-classifier", "predict", "b.png", "a.png", "--compact-backbone", "--device", "gpu",
        ])
        .unwrap();
        assert_eq!(cli.device, DevicePreference::Gpu);

        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.inputs, vec![std::path::PathBuf::from("b.png"), "a.png".into()]);
        assert!(args.model.compact_backbone);
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        for flag in ["--image-size", "--batch-size"] {
            let err = Cli::try_parse_from(["card-classifier", "train", flag, "0"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{flag}");
        }
        let cli = Cli::try_parse_from(["card-classifier", "train", "--image-size", "64"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.image_size, 64);
    }

    #[test]
    fn test_predict_requires_an_input() {
        assert!(Cli::try_parse_from(["card-classifier", "predict"]).is_err());
    }
}
