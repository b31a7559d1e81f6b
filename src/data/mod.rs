// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From image folders on disk to tensor batches:
//
//   dataset/<split>/<class>/*.png
//       │
//       ▼
//   loader          → lists class directories and image files
//       │
//       ▼
//   ImageTransform  → RGB, 128×128, [0,1], channel-major
//       │
//       ▼
//   CardDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   BatchProvider   → shuffled / ordered index groups
//       │
//       ▼
//   CardBatcher     → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Lists class subdirectories and image files
pub mod loader;

/// Resize-and-normalise image transform
pub mod transform;

/// Implements Burn's Dataset trait for one split
pub mod dataset;

/// Implements Burn's Batcher trait and the batch ordering
pub mod batcher;
