// ============================================================
// Layer 6 — Backbone Weight Store
// ============================================================
// Pretrained backbone weights are an external artifact: a Burn
// binary record of `EfficientNet` produced elsewhere (e.g. by
// converting ImageNet weights) and dropped next to the binary.
// The store only reads that record; the classifier sees the
// result through `FeatureExtractor`.
//
// Files always carry the `.bin` extension.

use burn::{
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings},
};
use std::path::{Path, PathBuf};

use crate::domain::error::CheckpointError;
use crate::ml::backbone::{EfficientNet, EfficientNetConfig};

type BackboneRecorder = BinFileRecorder<FullPrecisionSettings>;

pub struct BackboneStore {
    path: PathBuf,
}

impl BackboneStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().with_extension("bin") }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build `config` and fill it with the stored weights.
    pub fn load<B: Backend>(
        &self,
        config: &EfficientNetConfig,
        device: &B::Device,
    ) -> Result<EfficientNet<B>, CheckpointError> {
        if !self.path.is_file() {
            return Err(CheckpointError::Missing(self.path.clone()));
        }

        let backbone = config
            .init::<B>(device)
            .load_file(self.path.clone(), &BackboneRecorder::new(), device)
            .map_err(|e| CheckpointError::Record {
                path:    self.path.clone(),
                message: format!("{e:?}"),
            })?;

        tracing::info!("Loaded pretrained backbone from '{}'", self.path.display());
        Ok(backbone)
    }

}

/// Pretrained backbone if `path` is given, otherwise a randomly
/// initialised one.
pub fn load_or_init<B: Backend>(
    path:   Option<&Path>,
    config: &EfficientNetConfig,
    device: &B::Device,
) -> Result<EfficientNet<B>, CheckpointError> {
    match path {
        Some(path) => BackboneStore::new(path).load(config, device),
        None => {
            tracing::warn!("No pretrained backbone configured; starting from random weights");
            Ok(config.init(device))
        }
    }
}
