// ============================================================
// Layer 3 — Recognition Errors
// ============================================================
// Every failure in the preprocessing pipeline and the
// prediction service is one of these variants. The caller
// (CLI, or any other serving layer) decides how to present it.
//
//   Base64 / Image   → decode errors, a client-input fault
//   InvalidShape     → a raw grid that cannot be an image
//   ModelUnavailable → no artifact at the configured path yet
//   ModelLoad        → artifact exists but could not be read
//   Inference        → classifier output broke its contract

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cannot decode image data: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid image shape: {0}")]
    InvalidShape(String),

    #[error("model not available at '{}'; train a model first", path.display())]
    ModelUnavailable { path: PathBuf },

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

impl RecognitionError {
    /// True for malformed base64 or unparseable image bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Base64(_) | Self::Image(_))
    }

    /// True when prediction was refused because no model exists yet.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. })
    }
}

pub type RecognitionResult<T> = Result<T, RecognitionError>;
