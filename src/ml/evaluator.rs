// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a restored classifier on the test split, one sample at
// a time. A split with no samples yields a report whose
// accuracy and mean confidence are None.

use anyhow::Result;
use burn::{data::dataset::Dataset, prelude::*};
use std::path::Path;

use crate::data::dataset::CardDataset;
use crate::domain::{error::DatasetError, prediction::EvaluationReport, traits::ResultVisualizer};
use crate::infra::progress::phase_bar;
use crate::ml::inferencer::Inferencer;

pub fn evaluate<B: Backend>(
    inferencer:      &Inferencer<B>,
    test:            &CardDataset,
    visualizer:      &dyn ResultVisualizer,
    visualize_wrong: bool,
) -> Result<EvaluationReport> {
    let vocab = inferencer.vocabulary();
    if test.vocabulary() != vocab {
        return Err(DatasetError::VocabularyMismatch {
            split:    test.name().to_string(),
            expected: vocab.names().to_vec(),
            found:    test.vocabulary().names().to_vec(),
        }
        .into());
    }

    let mut report = EvaluationReport::new(vocab);
    if test.is_empty() {
        tracing::warn!("Split '{}' is empty; nothing to evaluate", test.name());
        return Ok(report);
    }

    let bar = phase_bar("Testing", test.len());
    for index in 0..test.len() {
        let item = test.load(index)?;
        let pred = inferencer.predict_pixels(item.image.clone())?;
        report.record(item.label, pred.class_index, pred.confidence);

        if pred.class_index != item.label {
            tracing::debug!(
                "Sample {} ('{}') misclassified as '{}' ({:.2}%)",
                index,
                test.path(index).unwrap_or(Path::new("?")).display(),
                pred.label,
                pred.confidence
            );
            if visualize_wrong {
                let shown = inferencer.transform().to_rgb_image(&item.image);
                let name  = format!("misclassified_{index:05}");
                if let Err(e) = visualizer.render_prediction(&name, &shown, &pred.probabilities, vocab.names()) {
                    tracing::warn!("Cannot render {name}: {e:#}");
                }
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    tracing::info!(
        correct   = report.correct,
        incorrect = report.incorrect,
        "evaluation finished"
    );
    Ok(report)
}
