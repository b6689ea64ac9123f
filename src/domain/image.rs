// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// The shapes an image takes on its way to the classifier:
//
//   ImageInput      → what the caller hands us (one of three
//                     tagged variants, resolved once at the
//                     pipeline entry point)
//   PixelGrid       → a validated H×W×C numeric grid
//   GrayFrame       → a single-channel H×W intensity array,
//                     still in the input's original scale
//   CanonicalFrame  → exactly 28×28, values in [0, 1]
//   TensorBatch     → N canonical frames laid out as
//                     [N, 1, 28, 28] for the classifier

use serde::{Deserialize, Serialize};

use crate::domain::error::{RecognitionError, RecognitionResult};
use crate::domain::{FRAME_PIXELS, FRAME_SIZE};

/// Largest channel count a raw grid may carry (RGBA).
pub const MAX_CHANNELS: usize = 4;

// ─── ImageInput ───────────────────────────────────────────────────────────────
/// An image as supplied by a caller.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// A numeric grid, with or without a trailing channel axis.
    RawGrid(PixelGrid),
    /// Encoded image file contents (PNG, JPEG, BMP, GIF).
    EncodedBytes(Vec<u8>),
    /// Base64 text, optionally wrapped in a `data:<mime>;base64,` URL.
    Base64Text(String),
}

impl From<PixelGrid> for ImageInput {
    fn from(grid: PixelGrid) -> Self {
        Self::RawGrid(grid)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::EncodedBytes(bytes)
    }
}

impl From<String> for ImageInput {
    fn from(text: String) -> Self {
        Self::Base64Text(text)
    }
}

// ─── PixelGrid ────────────────────────────────────────────────────────────────
/// Row-major H×W×C grid of intensities. A 2-D grid has `channels == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    height:   usize,
    width:    usize,
    channels: usize,
    data:     Vec<f32>,
}

impl PixelGrid {
    /// Build a grid, rejecting shapes that cannot describe an image.
    pub fn new(
        height:   usize,
        width:    usize,
        channels: usize,
        data:     Vec<f32>,
    ) -> RecognitionResult<Self> {
        if height == 0 || width == 0 {
            return Err(RecognitionError::InvalidShape(format!(
                "grid must be non-empty, got {height}x{width}"
            )));
        }
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(RecognitionError::InvalidShape(format!(
                "expected 1..={MAX_CHANNELS} channels, got {channels}"
            )));
        }
        let expected = height * width * channels;
        if data.len() != expected {
            return Err(RecognitionError::InvalidShape(format!(
                "{height}x{width}x{channels} grid needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self { height, width, channels, data })
    }

    /// Single-channel grid from a row-major buffer.
    pub fn gray(height: usize, width: usize, data: Vec<f32>) -> RecognitionResult<Self> {
        Self::new(height, width, 1, data)
    }

    /// Single-channel grid from nested rows. Ragged rows are rejected.
    pub fn from_rows(rows: &[Vec<f32>]) -> RecognitionResult<Self> {
        let height = rows.len();
        let width  = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err(RecognitionError::InvalidShape("ragged rows".to_string()));
        }
        Self::gray(height, width, rows.concat())
    }

    pub fn height(&self) -> usize { self.height }

    pub fn width(&self) -> usize { self.width }

    pub fn channels(&self) -> usize { self.channels }

    /// All channel values of the pixel at (row, col).
    pub fn pixel(&self, row: usize, col: usize) -> &[f32] {
        let start = (row * self.width + col) * self.channels;
        &self.data[start..start + self.channels]
    }

    pub fn as_slice(&self) -> &[f32] { &self.data }
}

// ─── GrayFrame ────────────────────────────────────────────────────────────────
/// Single-channel H×W intensity array of arbitrary scale.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayFrame {
    height: usize,
    width:  usize,
    data:   Vec<f32>,
}

impl GrayFrame {
    /// Callers guarantee `data.len() == height * width`.
    pub(crate) fn from_parts(height: usize, width: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), height * width);
        Self { height, width, data }
    }

    pub fn height(&self) -> usize { self.height }

    pub fn width(&self) -> usize { self.width }

    pub fn shape(&self) -> (usize, usize) { (self.height, self.width) }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    pub fn as_slice(&self) -> &[f32] { &self.data }

    pub fn into_vec(self) -> Vec<f32> { self.data }

    /// Largest value, or 0.0 for an empty frame.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max).max(0.0)
    }
}

// ─── CanonicalFrame ───────────────────────────────────────────────────────────
/// The only valid classifier input: 28×28, single channel, values in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFrame {
    pixels: Vec<f32>,
}

impl CanonicalFrame {
    /// All-zero frame ("nothing drawn").
    pub fn blank() -> Self {
        Self { pixels: vec![0.0; FRAME_PIXELS] }
    }

    /// Wraps 784 row-major values, clamping each into [0, 1].
    pub fn from_pixels(pixels: Vec<f32>) -> RecognitionResult<Self> {
        if pixels.len() != FRAME_PIXELS {
            return Err(RecognitionError::InvalidShape(format!(
                "canonical frame needs {FRAME_PIXELS} values, got {}",
                pixels.len()
            )));
        }
        let pixels = pixels.into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Ok(Self { pixels })
    }

    /// Resampler output, already 784 values in [0, 1].
    pub(crate) fn from_resampled(pixels: Vec<f32>) -> Self {
        debug_assert_eq!(pixels.len(), FRAME_PIXELS);
        Self { pixels }
    }

    pub fn shape(&self) -> (usize, usize) { (FRAME_SIZE, FRAME_SIZE) }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.pixels[row * FRAME_SIZE + col]
    }

    pub fn as_slice(&self) -> &[f32] { &self.pixels }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&v| v == 0.0)
    }

    /// Inclusive (row_min, row_max, col_min, col_max) of pixels above `threshold`.
    pub fn ink_bounds(&self, threshold: f32) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for row in 0..FRAME_SIZE {
            for col in 0..FRAME_SIZE {
                if self.get(row, col) > threshold {
                    bounds = Some(match bounds {
                        None => (row, row, col, col),
                        Some((r0, r1, c0, c1)) => (r0.min(row), r1.max(row), c0.min(col), c1.max(col)),
                    });
                }
            }
        }
        bounds
    }
}

// ─── TensorBatch ──────────────────────────────────────────────────────────────
/// Frames flattened into one NCHW buffer, the layout the classifier expects.
#[derive(Debug, Clone)]
pub struct TensorBatch {
    shape: [usize; 4],
    data:  Vec<f32>,
}

impl TensorBatch {
    pub fn from_frames(frames: &[CanonicalFrame]) -> Self {
        let data: Vec<f32> = frames
            .iter()
            .flat_map(|f| f.as_slice().iter().copied())
            .collect();
        Self {
            shape: [frames.len(), 1, FRAME_SIZE, FRAME_SIZE],
            data,
        }
    }

    /// Batch of one: [1, 1, 28, 28].
    pub fn single(frame: &CanonicalFrame) -> Self {
        Self::from_frames(std::slice::from_ref(frame))
    }

    pub fn shape(&self) -> [usize; 4] { self.shape }

    pub fn len(&self) -> usize { self.shape[0] }

    pub fn is_empty(&self) -> bool { self.shape[0] == 0 }

    pub fn data(&self) -> &[f32] { &self.data }
}
