// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Scores the served model on the MNIST test split:
//
//   Step 1: Make sure a model is loaded    (Layer 2 - service)
//   Step 2: Load the test split            (Layer 4 - data)
//   Step 3: Batched inference              (Layer 2 - service)
//   Step 4: Confusion matrix + report      (Layer 6 - infra)
//
// `score_samples` is shared with the train use case, which
// scores the freshly trained classifier the same way.

use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use serde::Serialize;

use crate::application::prediction_service::PredictionService;
use crate::data::mnist::MnistLoader;
use crate::domain::error::{RecognitionError, RecognitionResult};
use crate::domain::image::CanonicalFrame;
use crate::domain::prediction::PredictionResult;
use crate::domain::sample::{LabeledImage, Split};
use crate::domain::traits::DigitSource;
use crate::infra::metrics::{ClassScores, ConfusionMatrix};

/// Lower bound on a probability before taking its log.
const LOG_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub samples:          usize,
    pub accuracy:         f64,
    pub loss:             f64,
    pub confusion_matrix: Vec<Vec<usize>>,
    pub per_class:        Vec<ClassScores>,
    pub weighted_avg:     ClassScores,
}

/// Run `infer` over `samples` in chunks of `batch_size` and score the rows.
pub fn score_samples<F>(
    samples:    &[LabeledImage],
    batch_size: usize,
    mut infer:  F,
) -> Result<EvaluationReport>
where
    F: FnMut(&[CanonicalFrame]) -> RecognitionResult<Vec<Vec<f32>>>,
{
    ensure!(!samples.is_empty(), "nothing to evaluate: the sample set is empty");

    let mut matrix   = ConfusionMatrix::new();
    let mut log_loss = 0.0f64;

    for chunk in samples.chunks(batch_size.max(1)) {
        let frames = chunk
            .iter()
            .map(LabeledImage::to_frame)
            .collect::<RecognitionResult<Vec<_>>>()?;
        let rows = infer(&frames)?;
        ensure!(
            rows.len() == chunk.len(),
            "classifier returned {} rows for {} images", rows.len(), chunk.len()
        );

        for (sample, row) in chunk.iter().zip(&rows) {
            let label = usize::from(sample.label);
            let p = row
                .get(label)
                .copied()
                .ok_or_else(|| RecognitionError::Inference(format!("row of width {}", row.len())))?;
            log_loss -= f64::from(p.max(LOG_EPSILON)).ln();

            let predicted = PredictionResult::from_probabilities(row)?;
            matrix.record(label, usize::from(predicted.digit));
        }
    }

    Ok(EvaluationReport {
        samples:          matrix.total(),
        accuracy:         matrix.accuracy(),
        loss:             log_loss / samples.len() as f64,
        confusion_matrix: matrix.rows(),
        per_class:        matrix.class_scores(),
        weighted_avg:     matrix.weighted_average(),
    })
}

pub struct EvaluateUseCase {
    service:    Arc<PredictionService>,
    data_dir:   String,
    batch_size: usize,
}

impl EvaluateUseCase {
    pub fn new(service: Arc<PredictionService>, data_dir: String, batch_size: usize) -> Self {
        Self { service, data_dir, batch_size }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        self.execute_with(&MnistLoader::new(&self.data_dir))
    }

    pub fn execute_with(&self, source: &dyn DigitSource) -> Result<EvaluationReport> {
        // Fail fast before reading 10k images
        let loaded = self.service.load().context("Cannot load model for evaluation")?;
        if !loaded {
            return Err(RecognitionError::ModelUnavailable {
                path: self.service.model_path().to_path_buf(),
            }.into());
        }

        let test = source.load_split(Split::Test)?;
        let report = score_samples(&test, self.batch_size, |frames| {
            self.service.classify_frames(frames)
        })?;

        tracing::info!(
            "Evaluated {} test images: accuracy={:.2}% loss={:.4}",
            report.samples, report.accuracy * 100.0, report.loss,
        );
        Ok(report)
    }
}
