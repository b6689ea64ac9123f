// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Two flows pass through this layer.
//
// Serving — any caller image to the canonical frame:
//
//   ImageInput
//       │
//       ▼
//   codec             → base64 / data URL / PNG, JPEG… decoding
//       │
//       ▼
//   grayscale         → one intensity per pixel
//       │
//       ▼
//   isolator          → polarity fix, crop, square pad, 28×28
//       │
//       ▼
//   pipeline          → composes the above, fast path for 28×28
//
// Training — MNIST files to tensor batches:
//
//   mnist (IDX files) → splitter → dataset → batcher → DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Base64, data URL and image-format decoding; PNG encoding
pub mod codec;

/// Grayscale Normalizer
pub mod grayscale;

/// Digit Isolator: crop, centre and resample to 28×28
pub mod isolator;

/// Preprocessing Pipeline entry point
pub mod pipeline;

/// Reads MNIST IDX files
pub mod mnist;

/// Implements Burn's Dataset trait for labelled digits
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
