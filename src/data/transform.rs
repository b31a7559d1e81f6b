// ============================================================
// Layer 4 — Image Transform
// ============================================================
// Turns a decoded image of any size into the fixed model input:
//
//   1. Convert to 3-channel RGB
//   2. Resize to 128×128 (bilinear, aspect ratio ignored)
//   3. Scale each channel byte to [0, 1]
//   4. Lay out channel-major: all R, then all G, then all B
//
// The same transform is used for training, testing and
// prediction so the model always sees identically prepared input.

use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use std::path::Path;

use crate::domain::error::DatasetError;

/// Side length of the square model input
pub const IMAGE_SIZE: usize = 128;

/// Number of colour channels of the model input
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    size: usize,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::new(IMAGE_SIZE)
    }
}

impl ImageTransform {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of floats produced per image: 3 × size × size
    pub fn tensor_len(&self) -> usize {
        CHANNELS * self.size * self.size
    }

    /// Decode `path` and convert to RGB. Returns the untransformed image.
    pub fn open(&self, path: &Path) -> Result<RgbImage, DatasetError> {
        let img = image::open(path).map_err(|source| DatasetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(img.to_rgb8())
    }

    /// Decode `path` and apply the transform in one step.
    pub fn load(&self, path: &Path) -> Result<Vec<f32>, DatasetError> {
        let rgb = self.open(path)?;
        Ok(self.apply(&DynamicImage::ImageRgb8(rgb)))
    }

    /// Resize and normalise to a CHW float buffer in [0, 1].
    pub fn apply(&self, image: &DynamicImage) -> Vec<f32> {
        let side    = self.size as u32;
        let resized = image.resize_exact(side, side, FilterType::Triangle).to_rgb8();

        let plane   = self.size * self.size;
        let mut out = vec![0.0f32; CHANNELS * plane];

        for (i, pixel) in resized.pixels().enumerate() {
            out[i]             = pixel[0] as f32 / 255.0;
            out[plane + i]     = pixel[1] as f32 / 255.0;
            out[2 * plane + i] = pixel[2] as f32 / 255.0;
        }
        out
    }

    /// Inverse of `apply` for display. Values are clamped to [0, 1].
    pub fn to_rgb_image(&self, chw: &[f32]) -> RgbImage {
        let side  = self.size as u32;
        let plane = self.size * self.size;
        let byte  = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

        RgbImage::from_fn(side, side, |x, y| {
            let i = (y * side + x) as usize;
            let at = |c: usize| chw.get(c * plane + i).copied().unwrap_or(0.0);
            Rgb([byte(at(0)), byte(at(1)), byte(at(2))])
        })
    }
}
