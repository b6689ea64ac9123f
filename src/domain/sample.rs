// ============================================================
// Layer 3 — LabeledImage Domain Type
// ============================================================
// One dataset image in canonical 28×28 layout, stored as raw
// 0–255 bytes exactly as the IDX files carry them, plus its
// digit label.

use serde::{Deserialize, Serialize};

use crate::domain::error::RecognitionResult;
use crate::domain::image::CanonicalFrame;
use crate::domain::FRAME_PIXELS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledImage {
    /// 784 row-major intensities, 0 = background
    pub pixels: Vec<u8>,

    /// The digit drawn, 0–9
    pub label: u8,
}

impl LabeledImage {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        debug_assert_eq!(pixels.len(), FRAME_PIXELS);
        Self { pixels, label }
    }

    /// Pixel values scaled to [0, 1].
    pub fn normalized(&self) -> impl Iterator<Item = f32> + '_ {
        self.pixels.iter().map(|&p| f32::from(p) / 255.0)
    }

    pub fn to_frame(&self) -> RecognitionResult<CanonicalFrame> {
        CanonicalFrame::from_pixels(self.normalized().collect())
    }
}

/// Which half of a dataset to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}
