// ============================================================
// Layer 3 — Training History
// ============================================================
// Per-epoch losses, appended by the training loop and read by
// the metrics logger and the loss-curve plot.

use serde::{Deserialize, Serialize};

/// Losses recorded for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Sample-weighted mean cross-entropy over the training split
    pub train_loss: f64,

    /// Sample-weighted mean cross-entropy over the validation split
    pub val_loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Ordered sequence of epoch metrics. Only grows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn train_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.train_loss).collect()
    }

    pub fn val_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_loss).collect()
    }

    /// Epoch with the lowest validation loss
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        self.epochs
            .iter()
            .fold(None, |best: Option<&EpochMetrics>, m| match best {
                Some(b) if !m.is_improvement(b.val_loss) => Some(b),
                _ => Some(m),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_history_keeps_order() {
        let mut history = TrainingHistory::new();
        history.push(EpochMetrics::new(1, 3.0, 2.8));
        history.push(EpochMetrics::new(2, 2.0, 2.9));
        history.push(EpochMetrics::new(3, 1.5, 2.1));

        assert_eq!(history.train_losses(), vec![3.0, 2.0, 1.5]);
        assert_eq!(history.val_losses(), vec![2.8, 2.9, 2.1]);
        assert_eq!(history.best_epoch().map(|m| m.epoch), Some(3));
    }

    #[test]
    fn test_empty_history_has_no_best() {
        assert!(TrainingHistory::new().best_epoch().is_none());
    }
}
