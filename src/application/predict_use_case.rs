// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Thin workflow over PredictionService for the CLI:
//
//   predict_files()  — read each file, predict_batch, one
//                      outcome per file in argument order
//   predict_base64() — plain base64 or a data URL
//   status()         — try a load, report {loaded, path}

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::prediction_service::PredictionService;
use crate::domain::image::ImageInput;
use crate::domain::prediction::PredictionResult;

/// Per-input result; a failed input carries its error message.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Predicted {
        input:      String,
        #[serde(flatten)]
        prediction: PredictionResult,
    },
    Failed {
        input: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub path:   String,
}

pub struct PredictUseCase {
    service: Arc<PredictionService>,
}

impl PredictUseCase {
    pub fn new(service: Arc<PredictionService>) -> Self {
        Self { service }
    }

    pub fn predict_files(&self, paths: &[PathBuf]) -> Result<Vec<PredictionOutcome>> {
        let inputs = paths
            .iter()
            .map(|p| {
                fs::read(p)
                    .map(ImageInput::EncodedBytes)
                    .with_context(|| format!("Cannot read image '{}'", p.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let results = self.service.predict_batch(inputs);

        Ok(paths
            .iter()
            .zip(results)
            .map(|(path, result)| {
                let input = path.display().to_string();
                match result {
                    Ok(prediction) => PredictionOutcome::Predicted { input, prediction },
                    Err(e) => {
                        tracing::warn!("Prediction failed for '{input}': {e}");
                        PredictionOutcome::Failed { input, error: e.to_string() }
                    }
                }
            })
            .collect())
    }

    pub fn predict_base64(&self, text: &str) -> Result<PredictionResult> {
        let prediction = self
            .service
            .predict(ImageInput::Base64Text(text.to_string()))
            .context("Prediction failed")?;
        Ok(prediction)
    }

    pub fn status(&self) -> Result<ModelStatus> {
        let loaded = self.service.load()?;
        Ok(ModelStatus {
            loaded,
            path: self.service.model_path().display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::codec::{encode_png, encode_png_base64};
    use crate::domain::error::RecognitionResult;
    use crate::domain::image::TensorBatch;
    use crate::domain::traits::{Classifier, ClassifierLoader};
    use crate::domain::NUM_CLASSES;
    use std::path::Path;

    struct AlwaysFive;

    impl Classifier for AlwaysFive {
        fn infer(&self, batch: &TensorBatch) -> RecognitionResult<Vec<Vec<f32>>> {
            let row: Vec<f32> = (0..NUM_CLASSES).map(|i| if i == 5 { 0.82 } else { 0.02 }).collect();
            Ok(vec![row; batch.len()])
        }
    }

    struct NoLoader;

    impl ClassifierLoader for NoLoader {
        fn load(&self, _path: &Path) -> RecognitionResult<Arc<dyn Classifier>> {
            unreachable!()
        }
    }

    fn served() -> PredictUseCase {
        let service = Arc::new(PredictionService::new("unused.mpk", Arc::new(NoLoader)));
        service.set_model(Arc::new(AlwaysFive));
        PredictUseCase::new(service)
    }

    fn stroke_png() -> Vec<u8> {
        let mut pixels = vec![0u8; 40 * 40];
        for r in 10..30 {
            pixels[r * 40 + 20] = 255;
        }
        encode_png(&pixels, 40, 40).unwrap()
    }

    #[test]
    fn test_files_keep_order_and_report_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let bad  = dir.path().join("bad.png");
        fs::write(&good, stroke_png()).unwrap();
        fs::write(&bad, b"not an image").unwrap();

        let outcomes = served().predict_files(&[good, bad.clone()]).unwrap();
        assert!(matches!(&outcomes[0], PredictionOutcome::Predicted { prediction, .. } if prediction.digit == 5));
        match &outcomes[1] {
            PredictionOutcome::Failed { input, .. } => assert_eq!(input, &bad.display().to_string()),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = served().predict_files(&[PathBuf::from("/no/such/file.png")]).unwrap_err();
        assert!(err.to_string().contains("Cannot read image"));
    }

    #[test]
    fn test_outcome_json_is_flat() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        fs::write(&good, stroke_png()).unwrap();

        let outcomes = served().predict_files(&[good]).unwrap();
        let json = serde_json::to_value(&outcomes[0]).unwrap();
        assert_eq!(json["digit"], 5);
        assert_eq!(json["label"], "5");
        assert_eq!(json["probabilities"].as_array().unwrap().len(), NUM_CLASSES);
    }

    #[test]
    fn test_base64_data_url() {
        let mut pixels = vec![0u8; 40 * 40];
        pixels[20 * 40 + 20] = 255;
        let text = format!("data:image/png;base64,{}", encode_png_base64(&pixels, 40, 40).unwrap());

        let prediction = served().predict_base64(&text).unwrap();
        assert_eq!(prediction.label, "5");
    }

    #[test]
    fn test_status_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digit_cnn.mpk");
        let use_case = PredictUseCase::new(Arc::new(PredictionService::new(&path, Arc::new(NoLoader))));

        let status = use_case.status().unwrap();
        assert_eq!(status, ModelStatus { loaded: false, path: path.display().to_string() });
    }
}
