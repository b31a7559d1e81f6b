// ============================================================
// Layer 3 — Typed Errors
// ============================================================
// One enum per failure family so callers can tell a broken
// dataset apart from a broken checkpoint or an empty split.
// The application layer wraps these in anyhow with context.
//
// Reference: Rust Book §9 (Error Handling), thiserror docs

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the on-disk image-folder layout.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("no class subdirectories in {0}")]
    NoClasses(PathBuf),

    #[error("class vocabulary of split '{split}' does not match: expected {expected:?}, found {found:?}")]
    VocabularyMismatch {
        split:    String,
        expected: Vec<String>,
        found:    Vec<String>,
    },

    #[error("sample index {index} out of range for dataset of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot decode image '{path}': {source}")]
    Image {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while persisting or restoring classifier parameters.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint file not found: {0}")]
    Missing(PathBuf),

    #[error("checkpoint architecture mismatch: checkpoint has {found}, classifier expects {expected}")]
    ArchitectureMismatch { expected: String, found: String },

    #[error("checkpoint record error at '{path}': {message}")]
    Record { path: PathBuf, message: String },

    #[error("invalid model card '{path}': {source}")]
    ModelCard {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot access '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An operation that averages over a split received no samples.
#[derive(Debug, Error)]
#[error("split '{split}' contains no samples")]
pub struct EmptyInputError {
    pub split: String,
}

impl EmptyInputError {
    pub fn new(split: impl Into<String>) -> Self {
        Self { split: split.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatasetError::IndexOutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "sample index 7 out of range for dataset of 3");

        let err = EmptyInputError::new("test");
        assert_eq!(err.to_string(), "split 'test' contains no samples");
    }

    #[test]
    fn test_mismatch_names_both_sides() {
        let err = CheckpointError::ArchitectureMismatch {
            expected: "53 classes".into(),
            found:    "2 classes".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("53 classes"));
        assert!(msg.contains("2 classes"));
    }
}
