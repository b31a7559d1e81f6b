// ============================================================
// Layer 4 — Card Dataset
// ============================================================
// One split (train / valid / test) of the image-folder layout.
// Only paths and labels are kept in memory; pixels are decoded
// and transformed when a sample is requested.

use burn::data::dataset::Dataset;
use std::path::{Path, PathBuf};

use crate::data::{
    loader::{list_images, scan_class_dirs},
    transform::ImageTransform,
};
use crate::domain::{class_vocab::ClassVocabulary, error::DatasetError};

/// One transformed sample: CHW pixels in [0, 1] and its label index.
#[derive(Debug, Clone)]
pub struct CardItem {
    pub image: Vec<f32>,
    pub label: usize,
}

pub struct CardDataset {
    name:      String,
    vocab:     ClassVocabulary,
    samples:   Vec<(PathBuf, usize)>,
    transform: ImageTransform,
}

impl CardDataset {
    /// Open the split at `dir` using an existing vocabulary.
    /// The split's class directories must match `vocab` exactly.
    pub fn open(
        name:      &str,
        dir:       &Path,
        vocab:     &ClassVocabulary,
        transform: ImageTransform,
    ) -> Result<Self, DatasetError> {
        let found = ClassVocabulary::new(scan_class_dirs(dir)?);
        if &found != vocab {
            return Err(DatasetError::VocabularyMismatch {
                split:    name.to_string(),
                expected: vocab.names().to_vec(),
                found:    found.names().to_vec(),
            });
        }

        let mut samples = Vec::new();
        for (label, class) in vocab.names().iter().enumerate() {
            let files = list_images(&dir.join(class))?;
            samples.extend(files.into_iter().map(|p| (p, label)));
        }

        tracing::info!(
            "Split '{}': {} samples across {} classes from '{}'",
            name, samples.len(), vocab.len(), dir.display()
        );

        Ok(Self {
            name: name.to_string(),
            vocab: vocab.clone(),
            samples,
            transform,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocab
    }

    pub fn transform(&self) -> ImageTransform {
        self.transform
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.samples.get(index).map(|(p, _)| p.as_path())
    }

    /// Decode and transform sample `index`.
    pub fn load(&self, index: usize) -> Result<CardItem, DatasetError> {
        let (path, label) = self.samples.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.samples.len(),
        })?;
        let image = self.transform.load(path)?;
        Ok(CardItem { image, label: *label })
    }
}

impl Dataset<CardItem> for CardDataset {
    fn get(&self, index: usize) -> Option<CardItem> {
        match self.load(index) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("{}: {}", self.name, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── DatasetSplits ────────────────────────────────────────────────────────────
/// Train / validation / test splits sharing one vocabulary.
pub struct DatasetSplits {
    pub train: CardDataset,
    pub valid: CardDataset,
    pub test:  CardDataset,
}

impl DatasetSplits {
    /// Derive the vocabulary once from `root/train` and open the
    /// other splits against it.
    pub fn load(root: &Path, transform: ImageTransform) -> Result<Self, DatasetError> {
        let vocab = ClassVocabulary::new(scan_class_dirs(&root.join("train"))?);

        Ok(Self {
            train: CardDataset::open("train", &root.join("train"), &vocab, transform)?,
            valid: CardDataset::open("valid", &root.join("valid"), &vocab, transform)?,
            test:  CardDataset::open("test", &root.join("test"), &vocab, transform)?,
        })
    }

    pub fn vocabulary(&self) -> &ClassVocabulary {
        self.train.vocabulary()
    }
}
