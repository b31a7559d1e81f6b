// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one user-facing goal.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing (that's Layer 1)
//   - Only workflow coordination
//
// Every use case is generic over the Burn backend; Layer 1
// decides which one to run on.

// Fine-tune the classifier and write a checkpoint
pub mod train_use_case;

// Score a checkpoint on the test split
pub mod evaluate_use_case;

// Classify external images with a checkpoint
pub mod predict_use_case;
