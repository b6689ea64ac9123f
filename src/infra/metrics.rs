// ============================================================
// Layer 6 — Metrics
// ============================================================
// Three record keepers for training and evaluation:
//
//   MetricsLogger     — one CSV row per epoch (metrics.csv next
//                       to the model) for plotting learning
//                       curves
//   ProgressReporter  — overwrites training_progress.json with
//                       the current phase so a frontend can poll
//                       a long-running `train`
//   ConfusionMatrix   — accumulates (truth, prediction) pairs
//                       and derives accuracy and per-class
//                       precision / recall / F1
//
// Example CSV output:
//   epoch,train_loss,val_loss,val_acc,learning_rate
//   1,0.412300,0.151200,0.953100,0.001000

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::NUM_CLASSES;

// ─── Epoch CSV ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:         usize,
    pub train_loss:    f64,
    pub val_loss:      f64,
    pub val_acc:       f64,
    pub learning_rate: f64,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,val_acc,learning_rate")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.val_acc, m.learning_rate,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Progress file ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TrainingProgress {
    Loading { message: String },
    Building { message: String },
    Training {
        current_epoch: usize,
        total_epochs:  usize,
        loss:          f64,
        val_loss:      f64,
        val_acc:       f64,
    },
    Evaluating { message: String },
    Done { test_accuracy: f64, test_loss: f64 },
    Error { error: String },
}

#[derive(Debug, Clone)]
pub struct ProgressReporter {
    path: PathBuf,
}

impl ProgressReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Progress is advisory: a failed write is logged, never fatal.
    pub fn report(&self, progress: &TrainingProgress) {
        let written = serde_json::to_string(progress)
            .map_err(anyhow::Error::from)
            .and_then(|json| fs::write(&self.path, json).map_err(anyhow::Error::from));
        if let Err(e) = written {
            tracing::warn!("Cannot write progress to '{}': {e}", self.path.display());
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ─── Confusion matrix ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall:    f64,
    pub f1_score:  f64,
    pub support:   usize,
}

/// Rows are the true digit, columns the predicted digit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfusionMatrix {
    counts: [[usize; NUM_CLASSES]; NUM_CLASSES],
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, truth: usize, predicted: usize) {
        self.counts[truth][predicted] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..NUM_CLASSES).map(|i| self.counts[i][i]).sum();
        ratio(correct, self.total())
    }

    pub fn rows(&self) -> Vec<Vec<usize>> {
        self.counts.iter().map(|r| r.to_vec()).collect()
    }

    /// Scores per class; a class with no predictions scores 0 precision.
    pub fn class_scores(&self) -> Vec<ClassScores> {
        (0..NUM_CLASSES)
            .map(|c| {
                let tp        = self.counts[c][c];
                let support   = self.counts[c].iter().sum::<usize>();
                let predicted = (0..NUM_CLASSES).map(|r| self.counts[r][c]).sum::<usize>();
                let precision = ratio(tp, predicted);
                let recall    = ratio(tp, support);
                let f1_score  = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassScores { precision, recall, f1_score, support }
            })
            .collect()
    }

    /// Support-weighted mean of the per-class scores.
    pub fn weighted_average(&self) -> ClassScores {
        let scores = self.class_scores();
        let total  = self.total();
        let weigh  = |f: fn(&ClassScores) -> f64| {
            if total == 0 {
                return 0.0;
            }
            scores.iter().map(|s| f(s) * s.support as f64).sum::<f64>() / total as f64
        };
        ClassScores {
            precision: weigh(|s| s.precision),
            recall:    weigh(|s| s.recall),
            f1_score:  weigh(|s| s.f1_score),
            support:   total,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics {
            epoch: 1, train_loss: 0.5, val_loss: 0.25, val_acc: 0.9, learning_rate: 1e-3,
        }).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,val_loss,val_acc,learning_rate");
        assert_eq!(lines[1], "1,0.500000,0.250000,0.900000,0.001000");
    }

    #[test]
    fn test_progress_json_is_tagged_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ProgressReporter::new(dir.path().join("training_progress.json"));
        reporter.report(&TrainingProgress::Done { test_accuracy: 0.99, test_loss: 0.03 });

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(reporter.path()).unwrap()).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["test_accuracy"], 0.99);
    }

    #[test]
    fn test_progress_write_failure_is_not_fatal() {
        let reporter = ProgressReporter::new("/nonexistent/dir/progress.json");
        reporter.report(&TrainingProgress::Error { error: "boom".into() });
    }

    #[test]
    fn test_confusion_scores() {
        let mut cm = ConfusionMatrix::new();
        // class 0: 2 right; class 1: 1 right, 1 predicted as 0
        cm.record(0, 0);
        cm.record(0, 0);
        cm.record(1, 1);
        cm.record(1, 0);

        assert_eq!(cm.total(), 4);
        assert!((cm.accuracy() - 0.75).abs() < 1e-12);

        let scores = cm.class_scores();
        assert!((scores[0].precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(scores[0].recall, 1.0);
        assert_eq!(scores[1].precision, 1.0);
        assert_eq!(scores[1].recall, 0.5);
        assert_eq!(scores[5].support, 0);

        let avg = cm.weighted_average();
        assert_eq!(avg.support, 4);
        assert!((avg.recall - 0.75).abs() < 1e-12);
    }
}
