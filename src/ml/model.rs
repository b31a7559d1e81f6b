// ============================================================
// Layer 5 — Card Classifier
// ============================================================
// backbone (pretrained feature extractor, head removed)
//   → features [batch, feature_dim]
//   → linear head → logits [batch, num_classes]
//
// No activation on the output: callers apply softmax, the
// loss applies cross-entropy.

use burn::{
    nn::{loss::CrossEntropyLossConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::backbone::{EfficientNet, EfficientNetConfig, FeatureExtractor};

/// 52 ranks/suits plus the joker
pub const DEFAULT_NUM_CLASSES: usize = 53;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug, PartialEq)]
pub struct CardClassifierConfig {
    #[config(default = 53)]
    pub num_classes: usize,

    #[config(default = "EfficientNetConfig::b0()")]
    pub backbone: EfficientNetConfig,

    /// Keep backbone weights fixed and train only the head
    #[config(default = false)]
    pub freeze_backbone: bool,
}

impl CardClassifierConfig {
    /// True when parameters saved under `other` fit a model built from `self`.
    pub fn same_architecture(&self, other: &Self) -> bool {
        self.num_classes == other.num_classes && self.backbone == other.backbone
    }

    /// Short human-readable summary used in mismatch errors.
    pub fn describe(&self) -> String {
        format!(
            "{} classes on a {}-block backbone with {} features",
            self.num_classes,
            self.backbone.block_count(),
            self.backbone.head_channels,
        )
    }

    /// Fresh classifier: randomly initialised backbone and head.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CardClassifier<B> {
        self.init_with_backbone(self.backbone.init(device), device)
    }

    /// Classifier around an existing (e.g. pretrained) backbone.
    pub fn init_with_backbone<B: Backend>(
        &self,
        backbone: EfficientNet<B>,
        device:   &B::Device,
    ) -> CardClassifier<B> {
        let head     = LinearConfig::new(backbone.feature_dim(), self.num_classes).init(device);
        let backbone = if self.freeze_backbone { backbone.no_grad() } else { backbone };
        CardClassifier { backbone, head }
    }
}

#[derive(Module, Debug)]
pub struct CardClassifier<B: Backend> {
    pub backbone: EfficientNet<B>,
    pub head:     Linear<B>,
}

impl<B: Backend> CardClassifier<B> {
    /// images: [batch, 3, H, W] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.extract(images);
        self.head.forward(features)
    }

    /// Logits plus mean cross-entropy against `targets`.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_default_config() {
        let cfg = CardClassifierConfig::new();
        assert_eq!(cfg.num_classes, DEFAULT_NUM_CLASSES);
        assert_eq!(cfg.backbone, EfficientNetConfig::b0());
        assert!(!cfg.freeze_backbone);
    }

    #[test]
    fn test_logits_shape() {
        let device = Default::default();
        let model  = CardClassifierConfig::new()
            .with_num_classes(2)
            .with_backbone(EfficientNetConfig::compact())
            .init::<TestBackend>(&device);

        let logits = model.forward(Tensor::zeros([3, 3, 128, 128], &device));
        assert_eq!(logits.dims(), [3, 2]);
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let device = Default::default();
        let model  = CardClassifierConfig::new()
            .with_num_classes(4)
            .with_backbone(EfficientNetConfig::compact())
            .init::<TestBackend>(&device);

        let images  = Tensor::<TestBackend, 4>::ones([2, 3, 32, 32], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 3], [2]), &device);
        let (loss, logits) = model.forward_loss(images, targets);

        assert_eq!(logits.dims(), [2, 4]);
        let value: f32 = loss.into_scalar().elem();
        assert!(value.is_finite() && value > 0.0);
    }

    #[test]
    fn test_architecture_comparison_ignores_freezing() {
        let a = CardClassifierConfig::new();
        let b = CardClassifierConfig::new().with_freeze_backbone(true);
        let c = CardClassifierConfig::new().with_num_classes(2);
        assert!(a.same_architecture(&b));
        assert!(!a.same_architecture(&c));
        assert!(c.describe().starts_with("2 classes"));
    }
}
