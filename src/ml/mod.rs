// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The Burn model, its training loop and the Classifier
// implementation the prediction service runs. Apart from the
// Dataset/Batcher adapters in Layer 4, Burn stays in here.
//
//   model.rs      — DigitCnn: 3×3 stem, stride-2 downsample,
//                   residual blocks, global average pool,
//                   dropout, dense hidden + 10-way output.
//                   `simple` and `advanced` presets.
//
//   trainer.rs    — Adam + cross-entropy loop on an autodiff
//                   backend, plateau LR schedule, early
//                   stopping, best-epoch checkpoint
//
//   inferencer.rs — BurnClassifier (softmax rows per frame)
//                   and BurnLoader (config + CompactRecorder)
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning

/// Residual CNN digit classifier
pub mod model;

/// Training loop with validation, LR schedule and early stopping
pub mod trainer;

/// Burn-backed Classifier and ClassifierLoader
pub mod inferencer;
