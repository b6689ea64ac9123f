// ============================================================
// Layer 2 — Prediction Service
// ============================================================
// Process-wide owner of the model handle. Two states:
//
//   Unloaded ──load() / set_model()──► Loaded
//
//   load()          — idempotent; a missing artifact is Ok(false),
//                     not an error. Concurrent first loads are
//                     single-flight behind `load_gate`.
//   predict()       — snapshots the handle, then preprocesses and
//                     infers without holding any lock
//   predict_batch() — predict() per element, order preserved
//   set_model()     — atomic swap, valid at any time
//
// Readers hold the RwLock only to clone the Arc, so a swap
// during inference leaves the in-flight call on the old handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::data::pipeline::Preprocessor;
use crate::domain::error::{RecognitionError, RecognitionResult};
use crate::domain::image::{CanonicalFrame, ImageInput, TensorBatch};
use crate::domain::prediction::PredictionResult;
use crate::domain::traits::{Classifier, ClassifierLoader};
use crate::domain::NUM_CLASSES;

pub struct PredictionService {
    model_path:   PathBuf,
    loader:       Arc<dyn ClassifierLoader>,
    preprocessor: Preprocessor,
    handle:       RwLock<Option<Arc<dyn Classifier>>>,
    load_gate:    Mutex<()>,
}

impl PredictionService {
    pub fn new(model_path: impl Into<PathBuf>, loader: Arc<dyn ClassifierLoader>) -> Self {
        Self {
            model_path:   model_path.into(),
            loader,
            preprocessor: Preprocessor::new(),
            handle:       RwLock::new(None),
            load_gate:    Mutex::new(()),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.read().is_some()
    }

    /// Load the artifact if no model is held yet.
    ///
    /// Returns `Ok(false)` when the artifact does not exist; the service
    /// then stays unloaded. A present but unreadable artifact is an error.
    pub fn load(&self) -> RecognitionResult<bool> {
        if self.is_loaded() {
            return Ok(true);
        }

        let _gate = self.load_gate.lock();
        // Another caller may have finished while we waited
        if self.is_loaded() {
            return Ok(true);
        }

        if !self.model_path.is_file() {
            tracing::debug!("No model artifact at '{}'", self.model_path.display());
            return Ok(false);
        }

        let classifier = self.loader.load(&self.model_path)?;

        let mut slot = self.handle.write();
        // A set_model() that raced the disk read wins
        if slot.is_none() {
            *slot = Some(classifier);
        }
        Ok(true)
    }

    /// Replace the model handle; in-flight predictions finish on the old one.
    pub fn set_model(&self, classifier: Arc<dyn Classifier>) {
        *self.handle.write() = Some(classifier);
        tracing::info!("Model handle replaced");
    }

    pub fn predict(&self, image: impl Into<ImageInput>) -> RecognitionResult<PredictionResult> {
        let classifier = self.classifier()?;
        let frame = self.preprocessor.preprocess(image.into())?;

        let rows = infer_checked(classifier.as_ref(), std::slice::from_ref(&frame))?;
        PredictionResult::from_probabilities(&rows[0])
    }

    /// Each element succeeds or fails on its own.
    pub fn predict_batch<I>(&self, images: I) -> Vec<RecognitionResult<PredictionResult>>
    where
        I: IntoIterator,
        I::Item: Into<ImageInput>,
    {
        images.into_iter().map(|image| self.predict(image)).collect()
    }

    /// Probability rows for frames that are already canonical.
    pub fn classify_frames(&self, frames: &[CanonicalFrame]) -> RecognitionResult<Vec<Vec<f32>>> {
        let classifier = self.classifier()?;
        infer_checked(classifier.as_ref(), frames)
    }

    /// Snapshot of the current handle, loading once if needed.
    fn classifier(&self) -> RecognitionResult<Arc<dyn Classifier>> {
        if let Some(classifier) = self.handle.read().as_ref() {
            return Ok(Arc::clone(classifier));
        }

        self.load()?;
        self.handle
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| RecognitionError::ModelUnavailable { path: self.model_path.clone() })
    }
}

fn infer_checked(
    classifier: &dyn Classifier,
    frames:     &[CanonicalFrame],
) -> RecognitionResult<Vec<Vec<f32>>> {
    let rows = classifier.infer(&TensorBatch::from_frames(frames))?;

    if rows.len() != frames.len() {
        return Err(RecognitionError::Inference(format!(
            "expected {} probability rows, got {}", frames.len(), rows.len()
        )));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != NUM_CLASSES) {
        return Err(RecognitionError::Inference(format!(
            "expected {NUM_CLASSES} probabilities per row, got {}", bad.len()
        )));
    }
    Ok(rows)
}
