// ============================================================
// Layer 4 — Grayscale Normalizer
// ============================================================
// Collapses a raw grid to one intensity per pixel.
//
//   1 channel  → values pass through unchanged
//   4 channels → alpha dropped, then R, G, B averaged
//   2–3        → all channels averaged
//
// No range normalisation happens here; the output keeps the
// input's scale (0–1 or 0–255) and later stages decide.

use crate::domain::image::{GrayFrame, PixelGrid};

pub fn to_grayscale(grid: &PixelGrid) -> GrayFrame {
    let (height, width) = (grid.height(), grid.width());

    if grid.channels() == 1 {
        return GrayFrame::from_parts(height, width, grid.as_slice().to_vec());
    }

    // RGBA: the fourth channel is opacity, not colour
    let colour_channels = if grid.channels() == 4 { 3 } else { grid.channels() };

    let data = grid
        .as_slice()
        .chunks_exact(grid.channels())
        .map(|px| px[..colour_channels].iter().sum::<f32>() / colour_channels as f32)
        .collect();

    GrayFrame::from_parts(height, width, data)
}
