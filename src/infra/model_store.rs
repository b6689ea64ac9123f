// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores the trained CNN using Burn's
// CompactRecorder.
//
// One model artifact is two files side by side:
//
//   models/
//     digit_cnn.mpk    ← weights (MessagePack, half precision)
//     digit_cnn.json   ← TrainConfig, needed to rebuild the
//                        architecture before loading weights
//
// The weights file is the readiness signal: if it exists, a
// model has been trained.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::DigitCnn;

/// Extension CompactRecorder gives its files.
const WEIGHTS_EXTENSION: &str = "mpk";

pub struct ModelStore {
    /// Weights file, always with the recorder's extension
    weights: PathBuf,
}

impl ModelStore {
    pub fn new(model_path: impl AsRef<Path>) -> Self {
        Self { weights: Self::artifact_path(model_path) }
    }

    /// The path the recorder actually writes for `model_path`.
    pub fn artifact_path(model_path: impl AsRef<Path>) -> PathBuf {
        model_path.as_ref().with_extension(WEIGHTS_EXTENSION)
    }

    pub fn weights_path(&self) -> &Path {
        &self.weights
    }

    pub fn config_path(&self) -> PathBuf {
        self.weights.with_extension("json")
    }

    pub fn exists(&self) -> bool {
        self.weights.is_file()
    }

    pub fn save_model<B: Backend>(&self, model: &DigitCnn<B>) -> Result<()> {
        if let Some(parent) = self.weights.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        CompactRecorder::new()
            .record(model.clone().into_record(), self.weights.clone())
            .with_context(|| {
                format!("Failed to save model to '{}'", self.weights.display())
            })?;

        tracing::debug!("Saved model weights to '{}'", self.weights.display());
        Ok(())
    }

    /// Rebuild the architecture from the saved config, then load weights into it.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<DigitCnn<B>> {
        let cfg = self.load_config()?;
        let model: DigitCnn<B> = cfg.model_kind.config().init(device);

        let record = CompactRecorder::new()
            .load(self.weights.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained the model first?",
                    self.weights.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.config_path();

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot read model config from '{}'", path.display())
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))
    }
}
