// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by the upper layers:
//
//   checkpoint.rs      weights + model card on disk
//   backbone_store.rs  pretrained backbone artifact
//   metrics.rs         per-epoch CSV log
//   plot.rs            PNG rendering of results (ResultVisualizer)
//   device.rs          CPU / GPU selection at startup
//   progress.rs        indicatif bars for long loops
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Classifier checkpoint saving and loading
pub mod checkpoint;

/// Pretrained backbone weights
pub mod backbone_store;

/// Training metrics CSV logger
pub mod metrics;

/// plotters-backed visualizer
pub mod plot;

/// Compute device resolution
pub mod device;

pub mod progress;
