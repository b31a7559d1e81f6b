// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop with Adam.
//
//   - Training runs on the autodiff backend B
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher uses the inner backend as well; batch
//     norm uses its running statistics there
//   - Epoch losses are sample-weighted: each batch's mean loss is
//     multiplied by its size, summed, and divided by the split size
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{BatchProvider, CardBatcher},
    dataset::CardDataset,
};
use crate::domain::{
    error::EmptyInputError,
    history::{EpochMetrics, TrainingHistory},
};
use crate::infra::progress::phase_bar;
use crate::ml::model::CardClassifier;

/// Knobs the loop needs; the application layer fills these from TrainConfig.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub seed:          u64,
}

pub fn run_training<B: AutodiffBackend>(
    settings: &LoopSettings,
    mut model: CardClassifier<B>,
    train:    &CardDataset,
    valid:    &CardDataset,
    device:   &B::Device,
) -> Result<(CardClassifier<B>, TrainingHistory)> {
    if train.is_empty() {
        return Err(EmptyInputError::new(train.name()).into());
    }
    if valid.is_empty() {
        return Err(EmptyInputError::new(valid.name()).into());
    }

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let image_size    = train.transform().size();
    let train_batcher = CardBatcher::<B>::new(device.clone(), image_size);
    let valid_batcher = CardBatcher::<B::InnerBackend>::new(device.clone(), image_size);

    let mut train_order = BatchProvider::shuffled(settings.batch_size, settings.seed);
    let mut valid_order = BatchProvider::sequential(settings.batch_size);

    let mut history = TrainingHistory::new();

    for epoch in 1..=settings.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let bar = phase_bar("Training Loop", train.len());
        let mut running_loss = 0.0f64;

        for batch in train_order.batches(train, &train_batcher) {
            let batch = batch?;
            let n     = batch.len();
            let (loss, _) = model.forward_loss(batch.images, batch.targets);

            running_loss += loss.clone().into_scalar().elem::<f64>() * n as f64;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.learning_rate, model, grads);

            bar.inc(n as u64);
        }
        bar.finish_and_clear();
        let train_loss = running_loss / train.len() as f64;

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let bar = phase_bar("Validation Loop", valid.len());
        let mut running_loss = 0.0f64;

        for batch in valid_order.batches(valid, &valid_batcher) {
            let batch = batch?;
            let n     = batch.len();
            let (loss, _) = model_valid.forward_loss(batch.images, batch.targets);
            running_loss += loss.into_scalar().elem::<f64>() * n as f64;
            bar.inc(n as u64);
        }
        bar.finish_and_clear();
        let val_loss = running_loss / valid.len() as f64;

        println!(
            "Epoch [{}/{}], Train Loss: {:.4}, Val Loss: {:.4}",
            epoch, settings.epochs, train_loss, val_loss,
        );
        tracing::info!(epoch, train_loss, val_loss, "epoch finished");

        history.push(EpochMetrics::new(epoch, train_loss, val_loss));
    }

    if let Some(best) = history.best_epoch() {
        tracing::info!("Best validation loss {:.4} at epoch {}", best.val_loss, best.epoch);
    }
    Ok((model, history))
}
