// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (serving predictions, training, evaluating).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// PredictionService is the one piece of shared state: the
// CLI builds it once and hands an Arc to every use case, so
// `train` can hot-swap the model it just fitted.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Model handle owner: load, predict, set_model
pub mod prediction_service;

// The training workflow
pub mod train_use_case;

// Single / batch prediction and model status
pub mod predict_use_case;

// Test-split metrics
pub mod evaluate_use_case;

// Random training images as PNG
pub mod samples_use_case;
