// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load MNIST train + test     (Layer 4 - data)
//   Step 2: Split train/validation      (Layer 4 - data)
//   Step 3: Save config                 (Layer 6 - infra)
//   Step 4: Run training loop           (Layer 5 - ml)
//   Step 5: Score on the test split     (Layer 2 - evaluate)
//   Step 6: Hot-swap into the service   (Layer 2 - service)
//
// Every phase is mirrored to training_progress.json next to
// the model so a long run can be watched from outside.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::evaluate_use_case::{score_samples, EvaluationReport};
use crate::application::prediction_service::PredictionService;
use crate::data::{mnist::MnistLoader, splitter::split_train_val};
use crate::domain::image::TensorBatch;
use crate::domain::sample::Split;
use crate::domain::traits::{ClassifierTrainer, DigitSource};
use crate::infra::{
    metrics::{ProgressReporter, TrainingProgress},
    model_store::ModelStore,
};
use crate::ml::model::ModelKind;
use crate::ml::trainer::{BurnTrainer, TrainBackend};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the weights so inference can rebuild the architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:            String,
    pub model_path:          String,
    pub model_kind:          ModelKind,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub lr:                  f64,
    pub validation_fraction: f64,
    pub seed:                u64,
    pub num_workers:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:            "data/mnist".to_string(),
            model_path:          "models/digit_cnn.mpk".to_string(),
            model_kind:          ModelKind::Advanced,
            epochs:              15,
            batch_size:          128,
            lr:                  1e-3,
            validation_fraction: 0.1,
            seed:                42,
            num_workers:         2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub epochs_run:          usize,
    pub validation_loss:     f64,
    pub validation_accuracy: f64,
    pub test:                EvaluationReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:  TrainConfig,
    service: Arc<PredictionService>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, service: Arc<PredictionService>) -> Self {
        Self { config, service }
    }

    /// training_progress.json, beside the model artifact.
    pub fn progress_path(&self) -> PathBuf {
        let weights = ModelStore::artifact_path(&self.config.model_path);
        weights
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("training_progress.json")
    }

    /// Train the burn CNN on MNIST from `data_dir`.
    pub fn execute(&self) -> Result<TrainReport> {
        let progress = ProgressReporter::new(self.progress_path());
        let source   = MnistLoader::new(&self.config.data_dir);
        let device   = burn::backend::wgpu::WgpuDevice::default();
        let trainer  = BurnTrainer::<TrainBackend>::new(self.config.clone(), device, progress)?;
        self.execute_with(&source, &trainer)
    }

    /// The pipeline with its collaborators supplied by the caller.
    pub fn execute_with(
        &self,
        source:  &dyn DigitSource,
        trainer: &dyn ClassifierTrainer,
    ) -> Result<TrainReport> {
        let progress = ProgressReporter::new(self.progress_path());

        match self.run(source, trainer, &progress) {
            Ok(report) => {
                progress.report(&TrainingProgress::Done {
                    test_accuracy: report.test.accuracy,
                    test_loss:     report.test.loss,
                });
                Ok(report)
            }
            Err(e) => {
                progress.report(&TrainingProgress::Error { error: format!("{e:#}") });
                Err(e)
            }
        }
    }

    fn run(
        &self,
        source:   &dyn DigitSource,
        trainer:  &dyn ClassifierTrainer,
        progress: &ProgressReporter,
    ) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Load MNIST ────────────────────────────────────────────────
        progress.report(&TrainingProgress::Loading {
            message: format!("Loading MNIST from '{}'...", cfg.data_dir),
        });
        let train_set = source.load_split(Split::Train)?;
        let test_set  = source.load_split(Split::Test)?;

        // ── Step 2: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) =
            split_train_val(train_set, cfg.validation_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            train_samples.len(),
            val_samples.len(),
            test_set.len(),
        );

        // ── Step 3: Save config for inference ─────────────────────────────────
        ModelStore::new(&cfg.model_path).save_config(cfg)?;

        // ── Step 4: Training loop (Layer 5) ───────────────────────────────────
        let trained = trainer.train(train_samples, val_samples)?;

        // ── Step 5: Score on held-out test data ───────────────────────────────
        progress.report(&TrainingProgress::Evaluating {
            message: "Evaluating on test set...".to_string(),
        });
        let classifier = Arc::clone(&trained.classifier);
        let test = score_samples(&test_set, cfg.batch_size, |frames| {
            classifier.infer(&TensorBatch::from_frames(frames))
        })?;
        tracing::info!(
            "Test accuracy {:.2}% | test loss {:.4} after {} epochs",
            test.accuracy * 100.0, test.loss, trained.epochs_run,
        );

        // ── Step 6: Serve the new model ───────────────────────────────────────
        self.service.set_model(trained.classifier);

        Ok(TrainReport {
            epochs_run:          trained.epochs_run,
            validation_loss:     trained.validation_loss,
            validation_accuracy: trained.validation_accuracy,
            test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::RecognitionResult;
    use crate::domain::sample::LabeledImage;
    use crate::domain::traits::{Classifier, ClassifierLoader, TrainedClassifier};
    use crate::domain::{FRAME_PIXELS, NUM_CLASSES};
    use std::sync::Mutex;

    struct AlwaysThree;

    impl Classifier for AlwaysThree {
        fn infer(&self, batch: &TensorBatch) -> RecognitionResult<Vec<Vec<f32>>> {
            let row: Vec<f32> = (0..NUM_CLASSES).map(|i| if i == 3 { 1.0 } else { 0.0 }).collect();
            Ok(vec![row; batch.len()])
        }
    }

    /// Records the split sizes it was handed.
    #[derive(Default)]
    struct StubTrainer {
        seen: Mutex<Option<(usize, usize)>>,
    }

    impl ClassifierTrainer for StubTrainer {
        fn train(&self, train: Vec<LabeledImage>, validation: Vec<LabeledImage>) -> Result<TrainedClassifier> {
            *self.seen.lock().unwrap() = Some((train.len(), validation.len()));
            Ok(TrainedClassifier {
                classifier:          Arc::new(AlwaysThree),
                validation_loss:     0.1,
                validation_accuracy: 0.9,
                epochs_run:          2,
            })
        }
    }

    struct StubSource;

    impl DigitSource for StubSource {
        fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>> {
            let n = match split { Split::Train => 20, Split::Test => 4 };
            Ok((0..n).map(|i| LabeledImage::new(vec![0; FRAME_PIXELS], if i % 2 == 0 { 3 } else { 1 })).collect())
        }
    }

    struct EmptySource;

    impl DigitSource for EmptySource {
        fn load_split(&self, _split: Split) -> Result<Vec<LabeledImage>> {
            anyhow::bail!("no data here")
        }
    }

    struct NoLoader;

    impl ClassifierLoader for NoLoader {
        fn load(&self, _path: &Path) -> RecognitionResult<Arc<dyn Classifier>> {
            unreachable!("artifact never read in these tests")
        }
    }

    fn use_case(dir: &Path) -> (TrainUseCase, Arc<PredictionService>) {
        let cfg = TrainConfig {
            model_path:          dir.join("digit_cnn.mpk").display().to_string(),
            validation_fraction: 0.25,
            ..TrainConfig::default()
        };
        let service = Arc::new(PredictionService::new(dir.join("digit_cnn.mpk"), Arc::new(NoLoader)));
        (TrainUseCase::new(cfg, Arc::clone(&service)), service)
    }

    #[test]
    fn test_train_swaps_model_into_service() {
        let dir = tempfile::tempdir().unwrap();
        let (use_case, service) = use_case(dir.path());
        let trainer = StubTrainer::default();

        assert!(!service.is_loaded());
        let report = use_case.execute_with(&StubSource, &trainer).unwrap();

        assert_eq!(*trainer.seen.lock().unwrap(), Some((15, 5)));
        assert_eq!(report.epochs_run, 2);
        assert!((report.test.accuracy - 0.5).abs() < 1e-12);
        assert!(service.is_loaded());
        assert!(dir.path().join("digit_cnn.json").is_file());
    }

    #[test]
    fn test_progress_file_ends_done() {
        let dir = tempfile::tempdir().unwrap();
        let (use_case, _service) = use_case(dir.path());
        use_case.execute_with(&StubSource, &StubTrainer::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(use_case.progress_path()).unwrap()).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["test_accuracy"], 0.5);
    }

    #[test]
    fn test_failure_is_written_to_progress() {
        let dir = tempfile::tempdir().unwrap();
        let (use_case, service) = use_case(dir.path());

        assert!(use_case.execute_with(&EmptySource, &StubTrainer::default()).is_err());
        assert!(!service.is_loaded());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(use_case.progress_path()).unwrap()).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["error"].as_str().unwrap().contains("no data here"));
    }
}
