// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts of the system:
//
//   image.rs      — what an input image IS (raw grid, encoded
//                   bytes, base64 text) and the 2-D intensity
//                   frames the pipeline produces
//   prediction.rs — the structured result of one inference
//   sample.rs     — a labelled 28×28 training image
//   error.rs      — the error taxonomy shared by the core
//   traits.rs     — capabilities other layers implement
//                   (classifier, loader, trainer, data source)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits

/// Input images and intensity frames
pub mod image;

/// Structured prediction output
pub mod prediction;

/// Labelled training images
pub mod sample;

/// Error taxonomy for preprocessing and prediction
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;

/// Side length of the canonical frame the classifier consumes.
pub const FRAME_SIZE: usize = 28;

/// Number of pixels in one canonical frame.
pub const FRAME_PIXELS: usize = FRAME_SIZE * FRAME_SIZE;

/// Number of digit classes (0–9).
pub const NUM_CLASSES: usize = 10;
