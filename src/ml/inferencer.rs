// ============================================================
// Layer 5 — Inferencer
// ============================================================
// The burn-backed Classifier and ClassifierLoader.
//
// BurnClassifier keeps the model behind a mutex only long
// enough to clone it; module clones share their tensors, so
// each call runs its forward pass on a private snapshot and
// concurrent callers never wait on each other's inference.

use std::path::Path;
use std::sync::Arc;

use burn::prelude::*;
use parking_lot::Mutex;

use crate::domain::error::{RecognitionError, RecognitionResult};
use crate::domain::image::TensorBatch;
use crate::domain::traits::{Classifier, ClassifierLoader};
use crate::domain::NUM_CLASSES;
use crate::infra::model_store::ModelStore;
use crate::ml::model::DigitCnn;

/// Backend used for serving and evaluation.
pub type InferBackend = burn::backend::Wgpu;

pub struct BurnClassifier<B: Backend> {
    model:  Mutex<DigitCnn<B>>,
    device: B::Device,
}

impl<B: Backend> BurnClassifier<B> {
    pub fn new(model: DigitCnn<B>, device: B::Device) -> Self {
        Self { model: Mutex::new(model), device }
    }
}

impl<B: Backend> Classifier for BurnClassifier<B> {
    fn infer(&self, batch: &TensorBatch) -> RecognitionResult<Vec<Vec<f32>>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model.lock().clone();

        let input = Tensor::<B, 1>::from_floats(batch.data(), &self.device)
            .reshape(batch.shape());
        let probs = model
            .probabilities(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| RecognitionError::Inference(format!("{e:?}")))?;

        Ok(probs.chunks(NUM_CLASSES).map(<[f32]>::to_vec).collect())
    }
}

/// Loads a saved DigitCnn onto one device.
pub struct BurnLoader<B: Backend> {
    device: B::Device,
}

impl<B: Backend> BurnLoader<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> ClassifierLoader for BurnLoader<B> {
    fn load(&self, path: &Path) -> RecognitionResult<Arc<dyn Classifier>> {
        let model = ModelStore::new(path)
            .load_model::<B>(&self.device)
            .map_err(|e| RecognitionError::ModelLoad(format!("{e:#}")))?;
        tracing::info!("Model loaded from '{}'", path.display());
        Ok(Arc::new(BurnClassifier::new(model, self.device.clone())))
    }
}
