// ============================================================
// Layer 4 — Card Batcher and Batch Provider
// ============================================================
// CardBatcher implements Burn's Batcher trait: it stacks
// N CardItems into
//
//   images:  [N, 3, 128, 128]  float
//   targets: [N]               int
//
// BatchProvider decides which indices go into which batch
// (shuffled for training, in order for validation) and loads
// the items. A sample that fails to decode ends the iteration
// with an error instead of being dropped.
//
// Reference: Burn Book §4 (Batcher), rand::seq::SliceRandom

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::{
    dataset::{CardDataset, CardItem},
    transform::CHANNELS,
};
use crate::domain::error::DatasetError;

// ─── CardBatch ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct CardBatch<B: Backend> {
    /// Images — shape: [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,

    /// True labels — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> CardBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }
}

// ─── CardBatcher ──────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct CardBatcher<B: Backend> {
    device:     B::Device,
    image_size: usize,
}

impl<B: Backend> CardBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<CardItem, CardBatch<B>> for CardBatcher<B> {
    fn batch(&self, items: Vec<CardItem>) -> CardBatch<B> {
        let batch_size = items.len();
        let side       = self.image_size;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.image.iter().copied())
            .collect();
        let labels: Vec<i64> = items.iter().map(|item| item.label as i64).collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, CHANNELS, side, side]),
            &self.device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        CardBatch { images, targets }
    }
}

// ─── BatchProvider ────────────────────────────────────────────────────────────
/// Groups dataset indices into batches.
pub struct BatchProvider {
    batch_size: usize,
    rng:        Option<StdRng>,
}

impl BatchProvider {
    /// Batches in dataset order.
    pub fn sequential(batch_size: usize) -> Self {
        Self { batch_size: batch_size.max(1), rng: None }
    }

    /// Batches in a fresh random order on every call to `batches`.
    pub fn shuffled(batch_size: usize, seed: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
            rng:        Some(StdRng::seed_from_u64(seed)),
        }
    }

    /// Index groups for one pass over `len` samples.
    pub fn index_batches(&mut self, len: usize) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..len).collect();
        if let Some(rng) = self.rng.as_mut() {
            indices.shuffle(rng);
        }
        indices.chunks(self.batch_size).map(<[usize]>::to_vec).collect()
    }

    /// Load and stack every batch of one pass over `dataset`.
    pub fn batches<'a, B: Backend>(
        &mut self,
        dataset: &'a CardDataset,
        batcher: &'a CardBatcher<B>,
    ) -> impl Iterator<Item = Result<CardBatch<B>, DatasetError>> + 'a {
        self.index_batches(dataset.len())
            .into_iter()
            .map(move |group| {
                let items = group
                    .into_iter()
                    .map(|i| dataset.load(i))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(batcher.batch(items))
            })
    }
}
