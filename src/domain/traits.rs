// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The classifier is a capability behind these traits. The
// prediction service and the use cases only ever see them, so
// any architecture (the burn CNN in Layer 5, a stub in tests,
// a future model) can be substituted without touching the
// preprocessing pipeline or the service.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::error::RecognitionResult;
use crate::domain::image::TensorBatch;
use crate::domain::sample::{LabeledImage, Split};

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A loaded model that maps canonical frames to class probabilities.
///
/// Implementations:
///   - BurnClassifier → the CNN trained by this crate
pub trait Classifier: Send + Sync {
    /// One row per input frame, each row a distribution over the
    /// ten classes that sums to 1.
    fn infer(&self, batch: &TensorBatch) -> RecognitionResult<Vec<Vec<f32>>>;
}

// ─── ClassifierLoader ─────────────────────────────────────────────────────────
/// Deserialises a model artifact into a shareable classifier handle.
pub trait ClassifierLoader: Send + Sync {
    fn load(&self, path: &Path) -> RecognitionResult<Arc<dyn Classifier>>;
}

// ─── ClassifierTrainer ────────────────────────────────────────────────────────
/// Output of a training run.
pub struct TrainedClassifier {
    pub classifier:          Arc<dyn Classifier>,
    pub validation_loss:     f64,
    pub validation_accuracy: f64,
    pub epochs_run:          usize,
}

/// Fits a classifier on labelled images.
pub trait ClassifierTrainer {
    fn train(
        &self,
        train:      Vec<LabeledImage>,
        validation: Vec<LabeledImage>,
    ) -> Result<TrainedClassifier>;
}

// ─── DigitSource ──────────────────────────────────────────────────────────────
/// Any component that can provide labelled digit images.
///
/// Implementations:
///   - MnistLoader → reads the IDX files of the MNIST dataset
pub trait DigitSource {
    fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>>;
}
