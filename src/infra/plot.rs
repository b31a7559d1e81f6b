// ============================================================
// Layer 6 — Plot Renderer
// ============================================================
// ResultVisualizer backed by plotters' bitmap backend. Every
// render writes one PNG into the artifact directory and returns;
// nothing blocks waiting for a window to close.
//
//   loss_curve.png          train vs validation loss per epoch
//   <name>.png              image on the left, class bars on the right
//
// Reference: plotters docs (BitMapBackend, ChartBuilder)

use anyhow::{anyhow, Result};
use image::{imageops::{self, FilterType}, RgbImage};
use plotters::prelude::*;
use std::path::PathBuf;

use crate::domain::{history::TrainingHistory, prediction::argmax, traits::ResultVisualizer};

const LOSS_SIZE: (u32, u32) = (800, 500);
const PANEL_WIDTH: u32 = 400;
const ROW_HEIGHT: u32 = 16;

pub struct PlotRenderer {
    out_dir: PathBuf,
}

impl PlotRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    pub fn loss_curve_path(&self) -> PathBuf {
        self.out_dir.join("loss_curve.png")
    }

    /// Output file for `render_prediction(name, ..)`.
    pub fn image_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{}.png", sanitize(name)))
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)
            .map_err(|e| anyhow!("Cannot create '{}': {e}", self.out_dir.display()))
    }
}

impl ResultVisualizer for PlotRenderer {
    fn render_prediction(
        &self,
        name:          &str,
        image:         &RgbImage,
        probabilities: &[f32],
        class_names:   &[String],
    ) -> Result<()> {
        if probabilities.is_empty() {
            return Err(anyhow!("no class probabilities to plot for '{name}'"));
        }
        self.ensure_dir()?;
        let path   = self.image_path(name);
        let rows   = probabilities.len() as u32;
        let height = (rows * ROW_HEIGHT + 80).max(PANEL_WIDTH);

        let root = BitMapBackend::new(&path, (PANEL_WIDTH * 3, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("backend error: {e}"))?;
        let (left, right) = root.split_horizontally(PANEL_WIDTH as i32);

        // ── Image panel ───────────────────────────────────────────────────────
        let (w, h)  = fit_within(image.dimensions(), PANEL_WIDTH - 20);
        let resized = imageops::resize(image, w, h, FilterType::Triangle);
        let bitmap: BitMapElement<(i32, i32)> =
            BitMapElement::with_owned_buffer((10, 10), (w, h), resized.into_raw())
                .ok_or_else(|| anyhow!("image buffer does not match {w}x{h}"))?;
        left.draw(&bitmap).map_err(|e| anyhow!("draw error: {e}"))?;

        // ── Probability bars ──────────────────────────────────────────────────
        let n    = probabilities.len();
        let best = argmax(probabilities);

        let mut chart = ChartBuilder::on(&right)
            .margin(10)
            .caption("Class Predictions", ("sans-serif", 22))
            .set_label_area_size(LabelAreaPosition::Left, 160)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f32..1f32, -0.5f32..(n as f32 - 0.5))
            .map_err(|e| anyhow!("chart build error: {e}"))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|y| label_at(class_names, *y))
            .x_desc("Probability")
            .draw()
            .map_err(|e| anyhow!("mesh error: {e}"))?;

        chart
            .draw_series(probabilities.iter().enumerate().map(|(i, &p)| {
                let y     = i as f32;
                let color = if Some(i) == best { RED } else { BLUE };
                Rectangle::new([(0.0, y - 0.4), (p.clamp(0.0, 1.0), y + 0.4)], color.filled())
            }))
            .map_err(|e| anyhow!("draw error: {e}"))?;

        root.present().map_err(|e| anyhow!("render error: {e}"))?;
        tracing::info!("Wrote '{}'", path.display());
        Ok(())
    }

    fn render_loss_curve(&self, history: &TrainingHistory) -> Result<()> {
        if history.is_empty() {
            tracing::warn!("No epochs recorded; skipping loss curve");
            return Ok(());
        }
        self.ensure_dir()?;
        let path = self.loss_curve_path();

        let train = history.train_losses();
        let val   = history.val_losses();
        let y_max = train
            .iter()
            .chain(&val)
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0f64, f64::max)
            * 1.1;
        let x_max = history.len().max(2) as f64;

        let root = BitMapBackend::new(&path, LOSS_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("backend error: {e}"))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Loss over epochs", ("sans-serif", 24))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(1f64..x_max, 0f64..y_max.max(1e-3))
            .map_err(|e| anyhow!("chart build error: {e}"))?;

        chart
            .configure_mesh()
            .x_desc("Epoch")
            .y_desc("Loss")
            .draw()
            .map_err(|e| anyhow!("mesh error: {e}"))?;

        for (label, values, color) in [("Training loss", &train, BLUE), ("Validation loss", &val, RED)] {
            chart
                .draw_series(LineSeries::new(
                    values.iter().enumerate().map(|(i, &v)| ((i + 1) as f64, v)),
                    color.stroke_width(2),
                ))
                .map_err(|e| anyhow!("draw error: {e}"))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| anyhow!("legend error: {e}"))?;

        root.present().map_err(|e| anyhow!("render error: {e}"))?;
        tracing::info!("Wrote '{}'", path.display());
        Ok(())
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────
/// Scale `(w, h)` to fit a `side`×`side` box, keeping aspect ratio.
fn fit_within((w, h): (u32, u32), side: u32) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (1, 1);
    }
    let scale = side as f64 / w.max(h) as f64;
    (
        ((w as f64 * scale).round() as u32).max(1),
        ((h as f64 * scale).round() as u32).max(1),
    )
}

fn label_at(class_names: &[String], y: f32) -> String {
    let rounded = y.round();
    if (y - rounded).abs() > 1e-3 || rounded < 0.0 {
        return String::new();
    }
    class_names.get(rounded as usize).cloned().unwrap_or_default()
}

/// Keep file names portable.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::EpochMetrics;
    use std::path::Path;

    #[test]
    fn test_fit_within_keeps_aspect_ratio() {
        assert_eq!(fit_within((200, 100), 100), (100, 50));
        assert_eq!(fit_within((128, 128), 380), (380, 380));
        assert_eq!(fit_within((0, 10), 50), (1, 1));
    }

    #[test]
    fn test_labels_only_on_whole_rows() {
        let names = vec!["ace of spades".to_string(), "joker".to_string()];
        assert_eq!(label_at(&names, 1.0), "joker");
        assert_eq!(label_at(&names, 0.5), "");
        assert_eq!(label_at(&names, 7.0), "");
    }

    #[test]
    fn test_output_names() {
        let renderer = PlotRenderer::new("artifacts");
        assert_eq!(
            renderer.image_path("prediction_two of hearts.v2"),
            Path::new("artifacts").join("prediction_two_of_hearts_v2.png"),
        );
        assert_eq!(renderer.loss_curve_path(), Path::new("artifacts").join("loss_curve.png"));
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let tmp      = tempfile::tempdir().unwrap();
        let renderer = PlotRenderer::new(tmp.path().join("plots"));
        renderer.render_loss_curve(&TrainingHistory::new()).unwrap();
        assert!(!renderer.loss_curve_path().exists());
    }

    #[test]
    fn test_renders_loss_curve_and_prediction() {
        let tmp      = tempfile::tempdir().unwrap();
        let renderer = PlotRenderer::new(tmp.path().join("plots"));

        let mut history = TrainingHistory::new();
        history.push(EpochMetrics::new(1, 1.2, 1.4));
        history.push(EpochMetrics::new(2, 0.8, 1.1));
        renderer.render_loss_curve(&history).unwrap();
        assert!(renderer.loss_curve_path().is_file());

        let image = RgbImage::from_pixel(90, 120, image::Rgb([200, 30, 30]));
        let names = vec!["ace_of_spades".to_string(), "joker".to_string()];
        renderer
            .render_prediction("prediction_joker", &image, &[0.3, 0.7], &names)
            .unwrap();
        assert!(renderer.image_path("prediction_joker").is_file());
    }

    #[test]
    fn test_prediction_without_probabilities_is_an_error() {
        let tmp      = tempfile::tempdir().unwrap();
        let renderer = PlotRenderer::new(tmp.path());
        let image    = RgbImage::new(8, 8);
        assert!(renderer.render_prediction("empty", &image, &[], &[]).is_err());
        assert!(!renderer.image_path("empty").exists());
    }
}
