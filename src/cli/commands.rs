// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `predict`, `evaluate`,
// `status` and `samples` and all their configurable flags.
//
// The two paths every command shares (model artifact and MNIST
// directory) live in PathArgs and fall back to the MODEL_PATH
// and MNIST_DIR environment variables.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::ModelKind;

/// Locations shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Model weights file; a sibling .json holds the architecture
    #[arg(long, env = "MODEL_PATH", default_value = "models/digit_cnn.mpk", global = true)]
    pub model_path: String,

    /// Directory with the four uncompressed MNIST IDX files
    #[arg(long, env = "MNIST_DIR", default_value = "data/mnist", global = true)]
    pub data_dir: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the digit CNN on MNIST and save it
    Train(TrainArgs),

    /// Classify image files or a base64 image
    Predict(PredictArgs),

    /// Score the saved model on the MNIST test split
    Evaluate(EvaluateArgs),

    /// Report whether a model can be loaded
    Status,

    /// Print random training images as base64 PNGs
    Samples(SamplesArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Architecture preset
    #[arg(long, value_enum, default_value_t = ModelKind::Advanced)]
    pub model_kind: ModelKind,

    /// Upper bound on epochs; early stopping may end sooner
    #[arg(long, default_value_t = 15)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Initial Adam learning rate, halved on validation plateaus
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Share of the training split held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub validation_fraction: f64,

    /// Seed for the train/validation shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// DataLoader worker threads
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,
}

impl TrainArgs {
    /// The boundary between Layer 1 and Layer 2: the application
    /// layer never sees clap types.
    pub fn into_config(self, paths: &PathArgs) -> TrainConfig {
        TrainConfig {
            data_dir:            paths.data_dir.clone(),
            model_path:          paths.model_path.clone(),
            model_kind:          self.model_kind,
            epochs:              self.epochs,
            batch_size:          self.batch_size,
            lr:                  self.lr,
            validation_fraction: self.validation_fraction,
            seed:                self.seed,
            num_workers:         self.num_workers,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image file (PNG, JPEG, BMP, GIF); repeat for a batch
    #[arg(long = "image", conflicts_with = "base64", required_unless_present = "base64")]
    pub images: Vec<PathBuf>,

    /// Base64 image, optionally as a data URL
    #[arg(long)]
    pub base64: Option<String>,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Images per inference batch
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,
}

#[derive(Args, Debug)]
pub struct SamplesArgs {
    /// How many images to return
    #[arg(long, default_value_t = 10)]
    pub count: usize,

    /// Only images of this digit
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub digit: Option<u8>,
}
