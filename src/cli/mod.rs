// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Five commands are supported:
//   1. `train`    — fits the CNN on MNIST and saves it
//   2. `predict`  — classifies image files or a base64 image
//   3. `evaluate` — test-split accuracy, confusion matrix
//   4. `status`   — is a model available at the model path?
//   5. `samples`  — random training images as base64 PNGs
//
// Every result is printed to stdout as JSON.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use commands::{Commands, EvaluateArgs, PathArgs, PredictArgs, SamplesArgs, TrainArgs};
use crate::application::prediction_service::PredictionService;
use crate::infra::model_store::ModelStore;
use crate::ml::inferencer::{BurnLoader, InferBackend};

#[derive(Parser, Debug)]
#[command(
    name = "digit-recognizer",
    version,
    about = "Train a CNN on MNIST, then recognise handwritten digits in images."
)]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Build the shared service, then dispatch to the use case.
    pub fn run(self) -> Result<()> {
        let service = self.prediction_service();

        match self.command {
            Commands::Train(args)    => run_train(&self.paths, args, service),
            Commands::Predict(args)  => run_predict(args, service),
            Commands::Evaluate(args) => run_evaluate(&self.paths, args, service),
            Commands::Status         => run_status(service),
            Commands::Samples(args)  => run_samples(&self.paths, args),
        }
    }

    fn prediction_service(&self) -> Arc<PredictionService> {
        let model_path = ModelStore::artifact_path(&self.paths.model_path);
        let loader = BurnLoader::<InferBackend>::new(Default::default());
        Arc::new(PredictionService::new(model_path, Arc::new(loader)))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_train(paths: &PathArgs, args: TrainArgs, service: Arc<PredictionService>) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on MNIST in: {}", paths.data_dir);

    let use_case = TrainUseCase::new(args.into_config(paths), service);
    let report = use_case.execute()?;
    print_json(&report)
}

fn run_predict(args: PredictArgs, service: Arc<PredictionService>) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(service);
    match args.base64 {
        Some(text) => print_json(&use_case.predict_base64(&text)?),
        None       => print_json(&use_case.predict_files(&args.images)?),
    }
}

fn run_evaluate(paths: &PathArgs, args: EvaluateArgs, service: Arc<PredictionService>) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(service, paths.data_dir.clone(), args.batch_size);
    print_json(&use_case.execute()?)
}

fn run_status(service: Arc<PredictionService>) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    print_json(&PredictUseCase::new(service).status()?)
}

fn run_samples(paths: &PathArgs, args: SamplesArgs) -> Result<()> {
    use crate::application::samples_use_case::SamplesUseCase;

    let use_case = SamplesUseCase::new(paths.data_dir.clone());
    print_json(&use_case.execute(args.count, args.digit)?)
}
