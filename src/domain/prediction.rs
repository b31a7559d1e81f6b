// ============================================================
// Layer 3 — Prediction and Evaluation Results
// ============================================================
// Plain result types produced by the inferencer and evaluator.
// Neither is persisted; they are printed or rendered.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::class_vocab::ClassVocabulary;

/// Outcome of classifying one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Index of the winning class in the vocabulary
    pub class_index: usize,

    /// Name of the winning class
    pub label: String,

    /// Softmax probability of the winning class, as a percentage
    pub confidence: f32,

    /// Softmax probabilities over every class, in vocabulary order
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from a probability vector.
    /// Returns None when the vector is empty.
    pub fn from_probabilities(probabilities: Vec<f32>, vocab: &ClassVocabulary) -> Option<Self> {
        let class_index = argmax(&probabilities)?;
        let best        = probabilities[class_index];

        let label = vocab
            .name(class_index)
            .map(str::to_string)
            .unwrap_or_else(|| format!("class_{class_index}"));

        Some(Self {
            class_index,
            label,
            confidence: best * 100.0,
            probabilities,
        })
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicted class: {}, Confidence: {:.2}%", self.label, self.confidence)
    }
}

/// Index of the largest value; the first one wins a tie.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
        .map(|(i, _)| i)
}

/// Correct/total counts for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTally {
    pub correct: usize,
    pub total:   usize,
}

/// Running tally of a test-set evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub correct:     usize,
    pub incorrect:   usize,
    /// Winning-class confidence (percent) of every processed sample
    pub confidences: Vec<f32>,
    /// Per-class tallies indexed by the true label
    pub per_class:   Vec<ClassTally>,
    pub class_names: Vec<String>,
}

impl EvaluationReport {
    pub fn new(vocab: &ClassVocabulary) -> Self {
        Self {
            per_class:   vec![ClassTally::default(); vocab.len()],
            class_names: vocab.names().to_vec(),
            ..Self::default()
        }
    }

    /// Record one sample's outcome.
    pub fn record(&mut self, true_label: usize, predicted: usize, confidence: f32) {
        let hit = true_label == predicted;
        if hit {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.confidences.push(confidence);

        if let Some(tally) = self.per_class.get_mut(true_label) {
            tally.total += 1;
            if hit {
                tally.correct += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    /// Accuracy in percent, or None if nothing was evaluated.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            n => Some(self.correct as f64 / n as f64 * 100.0),
        }
    }

    /// Mean winning-class confidence in percent, or None if nothing was evaluated.
    pub fn mean_confidence(&self) -> Option<f64> {
        if self.confidences.is_empty() {
            return None;
        }
        let sum: f64 = self.confidences.iter().map(|&c| c as f64).sum();
        Some(sum / self.confidences.len() as f64)
    }

    /// Accuracy in percent for one class, or None if the class had no samples.
    pub fn class_accuracy(&self, class_index: usize) -> Option<f64> {
        self.per_class
            .get(class_index)
            .filter(|t| t.total > 0)
            .map(|t| t.correct as f64 / t.total as f64 * 100.0)
    }
}

fn percent_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Correct predictions: {}", self.correct)?;
        writeln!(f, "Wrong predictions: {}", self.incorrect)?;
        writeln!(f, "Accuracy: {}", percent_or_na(self.accuracy()))?;
        write!(f, "Average confidence: {}", percent_or_na(self.mean_confidence()))?;

        let seen: Vec<(usize, &ClassTally)> = self
            .per_class
            .iter()
            .enumerate()
            .filter(|(_, t)| t.total > 0)
            .collect();
        if seen.is_empty() {
            return Ok(());
        }
        write!(f, "\nPer-class accuracy:")?;
        for (i, tally) in seen {
            let name = self.class_names.get(i).map_or("?", String::as_str);
            write!(
                f,
                "\n  {name:<24} {:>7} ({}/{})",
                percent_or_na(self.class_accuracy(i)),
                tally.correct,
                tally.total
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_picks_argmax() {
        let vocab = ClassVocabulary::new(["ace of spades", "joker"]);
        let p = Prediction::from_probabilities(vec![0.25, 0.75], &vocab).unwrap();
        assert_eq!(p.class_index, 1);
        assert_eq!(p.label, "joker");
        assert!((p.confidence - 75.0).abs() < 1e-4);
        assert_eq!(p.to_string(), "Predicted class: joker, Confidence: 75.00%");
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let vocab = ClassVocabulary::new(["ace of spades", "joker", "two of hearts"]);
        let p = Prediction::from_probabilities(vec![0.4, 0.4, 0.2], &vocab).unwrap();
        assert_eq!(p.class_index, 0);
        assert_eq!(p.label, "ace of spades");
        assert_eq!(argmax(&[0.1, 0.3, 0.3, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_prediction_empty_vector() {
        let vocab = ClassVocabulary::new(["joker"]);
        assert!(Prediction::from_probabilities(Vec::new(), &vocab).is_none());
    }

    #[test]
    fn test_report_counts_add_up() {
        let mut report = EvaluationReport::new(&ClassVocabulary::new(["ace of spades", "joker"]));
        report.record(0, 0, 90.0);
        report.record(1, 0, 60.0);
        report.record(1, 1, 80.0);

        assert_eq!(report.correct + report.incorrect, report.total());
        assert_eq!(report.total(), 3);
        let acc = report.accuracy().unwrap();
        assert!((0.0..=100.0).contains(&acc));
        assert!((acc - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.mean_confidence().unwrap() - 230.0 / 3.0).abs() < 1e-4);
        assert_eq!(report.class_accuracy(0), Some(100.0));
        assert_eq!(report.class_accuracy(1), Some(50.0));

        let text = report.to_string();
        assert!(text.contains("Per-class accuracy:"), "{text}");
        assert!(text.contains("ace of spades"), "{text}");
        assert!(text.contains("50.00% (1/2)"), "{text}");
    }

    #[test]
    fn test_empty_report_has_no_accuracy() {
        let names: Vec<String> = (0..53).map(|i| format!("class_{i:02}")).collect();
        let report = EvaluationReport::new(&ClassVocabulary::new(names));
        assert_eq!(report.total(), 0);
        assert!(report.accuracy().is_none());
        assert!(report.mean_confidence().is_none());
        assert!(report.class_accuracy(0).is_none());
        assert!(report.to_string().contains("Accuracy: n/a"));
        assert!(!report.to_string().contains("Per-class"));
    }
}
