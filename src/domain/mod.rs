// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer:
//   - the class vocabulary
//   - per-epoch training history
//   - prediction and evaluation results
//   - typed errors
//   - the visualizer abstraction
//
// No Burn types live here.

pub mod class_vocab;

pub mod error;

pub mod history;

pub mod prediction;

pub mod traits;
