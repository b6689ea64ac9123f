// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   model_store.rs — Saving and loading the model artifact
//                    (CompactRecorder weights + TrainConfig
//                    JSON so inference can rebuild the CNN)
//
//   metrics.rs     — Epoch CSV log, training progress file,
//                    confusion matrix and classification
//                    report for evaluation
//
// Reference: Burn Book §5 (Checkpointing)

/// Model artifact saving and loading
pub mod model_store;

/// Training metrics, progress reporting and evaluation scores
pub mod metrics;
