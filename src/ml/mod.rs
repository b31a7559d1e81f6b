// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network.
//
//   backbone.rs    EfficientNet feature extractor behind the
//                  FeatureExtractor trait
//   model.rs       CardClassifier: backbone + linear head
//   trainer.rs     Adam training loop with validation
//   inferencer.rs  restored classifier → Prediction
//   evaluator.rs   per-sample scoring of the test split
//
// Every function is generic over the Burn backend; the CLI picks
// NdArray or Wgpu once at startup.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// EfficientNet backbone and the FeatureExtractor trait
pub mod backbone;

/// Card classifier architecture
pub mod model;

/// Training loop with validation
pub mod trainer;

/// Checkpoint-backed single-image prediction
pub mod inferencer;

/// Test-split evaluation
pub mod evaluator;
