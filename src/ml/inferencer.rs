// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Holds a restored classifier together with the vocabulary and
// transform it was trained with. Runs on a plain (non-autodiff)
// backend so batch norm uses its running statistics.
//
//   image → transform → [1, 3, S, S] → logits → softmax → Prediction

use anyhow::{anyhow, Result};
use burn::{prelude::*, tensor::activation::softmax};
use image::{DynamicImage, RgbImage};
use std::path::Path;

use crate::data::transform::ImageTransform;
use crate::domain::{class_vocab::ClassVocabulary, error::CheckpointError, prediction::Prediction};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{CardClassifier, CardClassifierConfig};

pub struct Inferencer<B: Backend> {
    model:     CardClassifier<B>,
    vocab:     ClassVocabulary,
    transform: ImageTransform,
    device:    B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(
        model:     CardClassifier<B>,
        vocab:     ClassVocabulary,
        transform: ImageTransform,
        device:    B::Device,
    ) -> Self {
        Self { model, vocab, transform, device }
    }

    /// Restore the classifier saved at `ckpt`. Label names and the
    /// input size come from the checkpoint's model card.
    pub fn from_checkpoint(
        ckpt:     &CheckpointManager,
        expected: &CardClassifierConfig,
        device:   &B::Device,
    ) -> Result<Self, CheckpointError> {
        let (model, card) = ckpt.load_model(expected.init::<B>(device), expected, device)?;
        tracing::info!(
            "Model ready: {} classes, {}×{} input",
            card.class_names.len(), card.image_size, card.image_size
        );
        Ok(Self::new(
            model,
            card.vocabulary(),
            ImageTransform::new(card.image_size),
            device.clone(),
        ))
    }

    pub fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocab
    }

    pub fn transform(&self) -> ImageTransform {
        self.transform
    }

    /// Class probabilities for one already-transformed image.
    pub fn probabilities(&self, pixels: Vec<f32>) -> Result<Vec<f32>> {
        let side  = self.transform.size();
        let input = Tensor::<B, 4>::from_data(TensorData::new(pixels, [1, 3, side, side]), &self.device);
        let probs = softmax_rows(self.model.forward(input));

        probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
    }

    pub fn predict_pixels(&self, pixels: Vec<f32>) -> Result<Prediction> {
        let probabilities = self.probabilities(pixels)?;
        Prediction::from_probabilities(probabilities, &self.vocab)
            .ok_or_else(|| anyhow!("Classifier produced no class scores"))
    }

    /// Classify the image file at `path`. Also returns the decoded
    /// original for display.
    pub fn predict_path(&self, path: &Path) -> Result<(Prediction, RgbImage)> {
        let original   = self.transform.open(path)?;
        let pixels     = self.transform.apply(&DynamicImage::ImageRgb8(original.clone()));
        let prediction = self.predict_pixels(pixels)?;
        tracing::debug!("{}: {}", path.display(), prediction);
        Ok((prediction, original))
    }
}

/// Softmax over the class dimension of `[batch, classes]` logits.
pub fn softmax_rows<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 2> {
    softmax(logits, 1)
}
