// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The evaluator and predictor only know this trait; the
// plotters implementation lives in infra, and tests or
// headless runs use NullVisualizer.

use anyhow::Result;
use image::RgbImage;

use crate::domain::history::TrainingHistory;

// ─── ResultVisualizer ────────────────────────────────────────────────────────
/// Renders classification results for a human to look at.
pub trait ResultVisualizer {
    /// Show `image` next to a bar chart of per-class probabilities.
    /// `name` identifies the output (e.g. the image file stem).
    fn render_prediction(
        &self,
        name:          &str,
        image:         &RgbImage,
        probabilities: &[f32],
        class_names:   &[String],
    ) -> Result<()>;

    /// Plot train and validation loss per epoch.
    fn render_loss_curve(&self, history: &TrainingHistory) -> Result<()>;
}

/// Visualizer that draws nothing.
pub struct NullVisualizer;

impl ResultVisualizer for NullVisualizer {
    fn render_prediction(&self, _: &str, _: &RgbImage, _: &[f32], _: &[String]) -> Result<()> {
        Ok(())
    }

    fn render_loss_curve(&self, _: &TrainingHistory) -> Result<()> {
        Ok(())
    }
}
