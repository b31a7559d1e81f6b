// ============================================================
// Layer 5 — EfficientNet Backbone
// ============================================================
// Feature extractor used by the card classifier:
//
//   stem    3×3 conv, stride 2 → BN → SiLU
//   stages  MBConv blocks (expand 1×1 → depthwise k×k →
//           squeeze-excitation → project 1×1, residual when
//           shape is preserved)
//   head    1×1 conv → BN → SiLU
//   pool    global average → flatten to [batch, feature_dim]
//
// `EfficientNetConfig::b0()` is the B0 stage table with a
// 1280-wide output; `compact()` is a narrow variant for CPU
// smoke runs.
//
// Reference: Tan & Le (2019) EfficientNet
//            Hu et al. (2018) Squeeze-and-Excitation Networks

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{sigmoid, silu},
};

/// Anything that maps normalised images to a fixed-size feature vector.
pub trait FeatureExtractor<B: Backend> {
    /// Width of the feature vector
    fn feature_dim(&self) -> usize;

    /// images: [batch, 3, H, W] → features: [batch, feature_dim]
    fn extract(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Config, Debug, PartialEq)]
pub struct StageConfig {
    pub expand_ratio: usize,
    pub channels:     usize,
    pub repeats:      usize,
    pub stride:       usize,
    pub kernel:       usize,
}

#[derive(Config, Debug, PartialEq)]
pub struct EfficientNetConfig {
    pub stem_channels: usize,
    pub stages:        Vec<StageConfig>,
    pub head_channels: usize,
}

impl EfficientNetConfig {
    /// EfficientNet-B0: 16 MBConv blocks, 1280 output features.
    pub fn b0() -> Self {
        Self::new(
            32,
            vec![
                StageConfig::new(1, 16, 1, 1, 3),
                StageConfig::new(6, 24, 2, 2, 3),
                StageConfig::new(6, 40, 2, 2, 5),
                StageConfig::new(6, 80, 3, 2, 3),
                StageConfig::new(6, 112, 3, 1, 5),
                StageConfig::new(6, 192, 4, 2, 5),
                StageConfig::new(6, 320, 1, 1, 3),
            ],
            1280,
        )
    }

    /// Two-stage variant with a 64-wide output.
    pub fn compact() -> Self {
        Self::new(
            8,
            vec![
                StageConfig::new(1, 8, 1, 1, 3),
                StageConfig::new(4, 16, 1, 2, 3),
            ],
            64,
        )
    }

    pub fn block_count(&self) -> usize {
        self.stages.iter().map(|s| s.repeats).sum()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> EfficientNet<B> {
        let stem = ConvBn::new(3, self.stem_channels, 3, 2, 1, device);

        let mut blocks   = Vec::with_capacity(self.block_count());
        let mut channels = self.stem_channels;
        for stage in &self.stages {
            for i in 0..stage.repeats {
                let stride = if i == 0 { stage.stride } else { 1 };
                blocks.push(MbConv::new(
                    channels, stage.channels, stage.expand_ratio, stage.kernel, stride, device,
                ));
                channels = stage.channels;
            }
        }

        let head = ConvBn::new(channels, self.head_channels, 1, 1, 1, device);
        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        EfficientNet { stem, blocks, head, pool, feature_dim: self.head_channels }
    }
}

// ─── Building blocks ──────────────────────────────────────────────────────────
/// Bias-free convolution followed by batch norm.
#[derive(Module, Debug)]
pub struct ConvBn<B: Backend> {
    conv: Conv2d<B>,
    bn:   BatchNorm<B, 2>,
}

impl<B: Backend> ConvBn<B> {
    fn new(
        in_ch:  usize,
        out_ch: usize,
        kernel: usize,
        stride: usize,
        groups: usize,
        device: &B::Device,
    ) -> Self {
        let pad  = kernel / 2;
        let conv = Conv2dConfig::new([in_ch, out_ch], [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(pad, pad))
            .with_groups(groups)
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_ch).init(device);
        Self { conv, bn }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

/// Channel attention: pool → reduce → SiLU → expand → sigmoid gate.
#[derive(Module, Debug)]
pub struct SqueezeExcite<B: Backend> {
    pool:   AdaptiveAvgPool2d,
    reduce: Conv2d<B>,
    expand: Conv2d<B>,
}

impl<B: Backend> SqueezeExcite<B> {
    fn new(channels: usize, squeezed: usize, device: &B::Device) -> Self {
        Self {
            pool:   AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            reduce: Conv2dConfig::new([channels, squeezed], [1, 1]).init(device),
            expand: Conv2dConfig::new([squeezed, channels], [1, 1]).init(device),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let gate = self.pool.forward(x.clone());
        let gate = silu(self.reduce.forward(gate));
        let gate = sigmoid(self.expand.forward(gate));
        x * gate
    }
}

/// Mobile inverted bottleneck block.
#[derive(Module, Debug)]
pub struct MbConv<B: Backend> {
    expand:    Option<ConvBn<B>>,
    depthwise: ConvBn<B>,
    se:        SqueezeExcite<B>,
    project:   ConvBn<B>,
    residual:  bool,
}

impl<B: Backend> MbConv<B> {
    fn new(
        in_ch:        usize,
        out_ch:       usize,
        expand_ratio: usize,
        kernel:       usize,
        stride:       usize,
        device:       &B::Device,
    ) -> Self {
        let hidden = in_ch * expand_ratio;
        let expand = (expand_ratio != 1).then(|| ConvBn::new(in_ch, hidden, 1, 1, 1, device));

        Self {
            expand,
            depthwise: ConvBn::new(hidden, hidden, kernel, stride, hidden, device),
            // SE width is a quarter of the block input, as in the reference B0
            se:        SqueezeExcite::new(hidden, (in_ch / 4).max(1), device),
            project:   ConvBn::new(hidden, out_ch, 1, 1, 1, device),
            residual:  stride == 1 && in_ch == out_ch,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut h = x.clone();
        if let Some(expand) = &self.expand {
            h = silu(expand.forward(h));
        }
        let h = silu(self.depthwise.forward(h));
        let h = self.se.forward(h);
        let h = self.project.forward(h);

        if self.residual { h + x } else { h }
    }
}

// ─── EfficientNet ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct EfficientNet<B: Backend> {
    stem:        ConvBn<B>,
    blocks:      Vec<MbConv<B>>,
    head:        ConvBn<B>,
    pool:        AdaptiveAvgPool2d,
    feature_dim: usize,
}

impl<B: Backend> FeatureExtractor<B> for EfficientNet<B> {
    fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    fn extract(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = silu(self.stem.forward(images));
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = silu(self.head.forward(x));
        self.pool.forward(x).flatten::<2>(1, 3)
    }
}
