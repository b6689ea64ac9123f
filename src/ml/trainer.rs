// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend,
//     so validation batches are built for B::InnerBackend
//   - argmax(1) returns [batch, 1]; flatten before .equal()
//
// Two schedules watch the validation metrics each epoch:
//   PlateauSchedule — halves the learning rate after 3 epochs
//                     without a val_loss improvement (floor 1e-6)
//   EarlyStopping   — stops after 5 epochs without a val_acc
//                     improvement; the best epoch's weights are
//                     the ones saved and returned
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::{DigitBatch, DigitBatcher}, dataset::DigitDataset};
use crate::domain::sample::LabeledImage;
use crate::domain::traits::{ClassifierTrainer, TrainedClassifier};
use crate::infra::metrics::{EpochMetrics, MetricsLogger, ProgressReporter, TrainingProgress};
use crate::infra::model_store::ModelStore;
use crate::ml::inferencer::BurnClassifier;
use crate::ml::model::DigitCnn;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

const LR_FACTOR:         f64   = 0.5;
const LR_PATIENCE:       usize = 3;
const LR_FLOOR:          f64   = 1e-6;
const LR_MIN_DELTA:      f64   = 1e-4;
const STOPPING_PATIENCE: usize = 5;

// ─── Learning-rate schedule ───────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct PlateauSchedule {
    lr:       f64,
    factor:   f64,
    patience: usize,
    floor:    f64,
    best:     f64,
    wait:     usize,
}

impl PlateauSchedule {
    pub fn new(lr: f64, factor: f64, patience: usize, floor: f64) -> Self {
        Self { lr, factor, patience, floor, best: f64::INFINITY, wait: 0 }
    }

    pub fn lr(&self) -> f64 { self.lr }

    /// Feed one epoch's validation loss; returns the rate for the next epoch.
    pub fn step(&mut self, val_loss: f64) -> f64 {
        if val_loss < self.best - LR_MIN_DELTA {
            self.best = val_loss;
            self.wait = 0;
            return self.lr;
        }

        self.wait += 1;
        if self.wait >= self.patience && self.lr > self.floor {
            let reduced = (self.lr * self.factor).max(self.floor);
            tracing::info!("Reducing learning rate {:.2e} → {:.2e}", self.lr, reduced);
            self.lr   = reduced;
            self.wait = 0;
        }
        self.lr
    }
}

// ─── Early stopping ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best:     f64,
    wait:     usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best: f64::NEG_INFINITY, wait: 0 }
    }

    /// Returns true when `val_acc` is the best seen so far.
    pub fn observe(&mut self, val_acc: f64) -> bool {
        if val_acc > self.best {
            self.best = val_acc;
            self.wait = 0;
            true
        } else {
            self.wait += 1;
            false
        }
    }

    pub fn should_stop(&self) -> bool {
        self.wait >= self.patience
    }
}

// ─── BurnTrainer ──────────────────────────────────────────────────────────────
pub struct BurnTrainer<B: AutodiffBackend> {
    cfg:      TrainConfig,
    device:   B::Device,
    store:    ModelStore,
    metrics:  MetricsLogger,
    progress: ProgressReporter,
}

impl<B: AutodiffBackend> BurnTrainer<B> {
    pub fn new(cfg: TrainConfig, device: B::Device, progress: ProgressReporter) -> Result<Self> {
        let store = ModelStore::new(&cfg.model_path);
        let metrics_dir = store
            .weights_path()
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let metrics = MetricsLogger::new(metrics_dir)?;
        Ok(Self { cfg, device, store, metrics, progress })
    }
}

/// Mean loss and accuracy of `model` over validation batches.
fn validate<B: Backend>(
    model:   &DigitCnn<B>,
    batches: impl Iterator<Item = DigitBatch<B>>,
) -> (f64, f64) {
    let mut loss_sum = 0.0f64;
    let mut batches_seen = 0usize;
    let mut correct = 0usize;
    let mut total   = 0usize;

    for batch in batches {
        total += batch.targets.dims()[0];
        let (loss, logits) = model.forward_loss(batch.images, batch.targets.clone());
        loss_sum += loss.into_scalar().elem::<f64>();
        batches_seen += 1;

        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(batch.targets)
            .int().sum().into_scalar().elem::<i64>();
        correct += hits as usize;
    }

    let avg_loss = if batches_seen > 0 { loss_sum / batches_seen as f64 } else { f64::NAN };
    let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
    (avg_loss, accuracy)
}

impl<B: AutodiffBackend> ClassifierTrainer for BurnTrainer<B> {
    fn train(
        &self,
        train:      Vec<LabeledImage>,
        validation: Vec<LabeledImage>,
    ) -> Result<TrainedClassifier> {
        ensure!(!train.is_empty(), "training set is empty");
        ensure!(!validation.is_empty(), "validation set is empty; raise --validation-fraction");
        let cfg = &self.cfg;

        // ── Build model ───────────────────────────────────────────────────────
        self.progress.report(&TrainingProgress::Building {
            message: format!("Building {:?} model...", cfg.model_kind),
        });
        let mut model: DigitCnn<B> = cfg.model_kind.config().init(&self.device);
        let mut optim = AdamConfig::new().init();
        tracing::info!("Model ready: {:?}, {} residual blocks", cfg.model_kind, model.blocks.len());

        // ── Data loaders ──────────────────────────────────────────────────────
        let train_dataset = DigitDataset::new(train);
        let val_dataset   = DigitDataset::new(validation);
        tracing::debug!(
            "{} training images per class: {:?}",
            train_dataset.sample_count(),
            train_dataset.class_counts(),
        );

        let train_loader = DataLoaderBuilder::new(DigitBatcher::<B>::new())
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(cfg.num_workers)
            .set_device(self.device.clone())
            .build(train_dataset);

        let val_loader = DataLoaderBuilder::new(DigitBatcher::<B::InnerBackend>::new())
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .set_device(self.device.clone())
            .build(val_dataset);

        let mut schedule = PlateauSchedule::new(cfg.lr, LR_FACTOR, LR_PATIENCE, LR_FLOOR);
        let mut stopper  = EarlyStopping::new(STOPPING_PATIENCE);
        let mut best: Option<(DigitCnn<B::InnerBackend>, f64, f64)> = None;
        let mut epochs_run = 0usize;

        self.progress.report(&TrainingProgress::Training {
            current_epoch: 0, total_epochs: cfg.epochs, loss: 0.0, val_loss: 0.0, val_acc: 0.0,
        });

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {
            let lr = schedule.lr();
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in train_loader.iter() {
                let (loss, _) = model.forward_loss(batch.images, batch.targets);
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches  += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);
            }
            let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };

            // Dropout is inactive on the inner backend
            let model_valid = model.valid();
            let (val_loss, val_acc) = validate(&model_valid, val_loader.iter());
            epochs_run = epoch;

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.2}% | lr={:.2e}",
                epoch, cfg.epochs, train_loss, val_loss, val_acc * 100.0, lr,
            );
            self.metrics.log(&EpochMetrics {
                epoch, train_loss, val_loss, val_acc, learning_rate: lr,
            })?;
            self.progress.report(&TrainingProgress::Training {
                current_epoch: epoch,
                total_epochs:  cfg.epochs,
                loss:          train_loss,
                val_loss,
                val_acc,
            });

            if stopper.observe(val_acc) {
                best = Some((model_valid, val_loss, val_acc));
            }
            schedule.step(val_loss);

            if stopper.should_stop() {
                tracing::info!("Early stop after epoch {}: no val_acc gain in {} epochs",
                    epoch, STOPPING_PATIENCE);
                break;
            }
        }

        let (best_model, validation_loss, validation_accuracy) = match best {
            Some(found) => found,
            None => (model.valid(), f64::NAN, 0.0),
        };

        self.store.save_model(&best_model)?;
        tracing::info!("Best model saved to '{}'", self.store.weights_path().display());

        Ok(TrainedClassifier {
            classifier: Arc::new(BurnClassifier::new(best_model, self.device.clone())),
            validation_loss,
            validation_accuracy,
            epochs_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FRAME_PIXELS;
    use crate::ml::model::ModelKind;

    #[test]
    fn test_plateau_reduces_after_patience() {
        let mut s = PlateauSchedule::new(1e-3, 0.5, 3, 1e-6);
        assert_eq!(s.step(1.0), 1e-3);
        assert_eq!(s.step(1.0), 1e-3);
        assert_eq!(s.step(1.0), 1e-3);
        assert_eq!(s.step(1.0), 5e-4);
        // improvement resets the counter
        assert_eq!(s.step(0.5), 5e-4);
        assert_eq!(s.step(0.6), 5e-4);
    }

    #[test]
    fn test_plateau_respects_floor() {
        let mut s = PlateauSchedule::new(1.5e-6, 0.5, 1, 1e-6);
        s.step(1.0);
        assert_eq!(s.step(1.0), 1e-6);
        assert_eq!(s.step(1.0), 1e-6);
    }

    #[test]
    fn test_early_stopping() {
        let mut e = EarlyStopping::new(2);
        assert!(e.observe(0.5));
        assert!(e.observe(0.6));
        assert!(!e.observe(0.6));
        assert!(!e.should_stop());
        assert!(!e.observe(0.55));
        assert!(e.should_stop());
    }

    #[test]
    fn test_one_epoch_on_cpu_saves_model() {
        type CpuTrain = burn::backend::Autodiff<burn::backend::NdArray>;

        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            model_path:  dir.path().join("cnn.mpk").display().to_string(),
            model_kind:  ModelKind::Simple,
            epochs:      1,
            batch_size:  4,
            num_workers: 1,
            ..TrainConfig::default()
        };
        let samples: Vec<LabeledImage> = (0..12u8)
            .map(|i| LabeledImage::new(vec![i * 20; FRAME_PIXELS], i % 10))
            .collect();
        let (train, val) = samples.split_at(8);

        let progress = ProgressReporter::new(dir.path().join("training_progress.json"));
        let trainer = BurnTrainer::<CpuTrain>::new(cfg, Default::default(), progress).unwrap();
        let trained = trainer.train(train.to_vec(), val.to_vec()).unwrap();

        assert_eq!(trained.epochs_run, 1);
        assert!((0.0..=1.0).contains(&trained.validation_accuracy));
        assert!(dir.path().join("cnn.mpk").is_file());
        assert!(dir.path().join("metrics.csv").is_file());
    }
}
