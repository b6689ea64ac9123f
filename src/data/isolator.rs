// ============================================================
// Layer 4 — Digit Isolator
// ============================================================
// Turns an arbitrarily sized grayscale drawing into the
// canonical 28×28 frame by finding the digit and centring it.
//
// Resizing a large, sparse canvas straight to 28×28 leaves a
// few faint pixels; the classifier was trained on digits that
// fill the frame. So the isolator:
//
//   1. Brings values to the 0–255 byte range for analysis
//   2. Estimates the background from the 1-pixel border
//      (median) and inverts when it is light, so the digit is
//      always bright ink on a dark background
//   3. Renormalises to [0, 1]
//   4. Marks pixels above INK_THRESHOLD as ink
//   5. Returns a blank frame when there is no ink at all
//   6. Crops to the ink bounding box
//   7. Pads the crop to a square, centred (odd remainder on the
//      trailing side)
//   8. Resamples the square to 28×28 with Lanczos3
//
// Reference: image crate docs (imageops::resize, FilterType)

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

use crate::domain::image::{CanonicalFrame, GrayFrame};
use crate::domain::FRAME_SIZE;

/// Normalised intensity above which a pixel counts as ink.
pub const INK_THRESHOLD: f32 = 0.2;

/// Border median (normalised) above which the background is light.
pub const LIGHT_BACKGROUND: f32 = 0.5;

/// Inclusive bounding box: (row_min, row_max, col_min, col_max).
type Bounds = (usize, usize, usize, usize);

pub fn isolate(gray: &GrayFrame) -> CanonicalFrame {
    let (height, width) = gray.shape();

    // ── Steps 1–2: byte range + polarity ──────────────────────────────────────
    let mut bytes = to_byte_range(gray);
    let background = border_median(&bytes, height, width) / 255.0;
    if background > LIGHT_BACKGROUND {
        tracing::debug!("Light background ({:.3}), inverting", background);
        bytes.iter_mut().for_each(|b| *b = 255 - *b);
    }

    // ── Step 3: back to [0, 1] ────────────────────────────────────────────────
    let norm: Vec<f32> = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();

    // ── Steps 4–6: ink mask and bounding box ──────────────────────────────────
    let Some(bounds) = ink_bounds(&norm, height, width) else {
        return CanonicalFrame::blank();
    };

    // ── Steps 7–8: square pad, resample ───────────────────────────────────────
    let (square, size) = pad_to_square(&norm, width, bounds);
    resample(&square, size)
}

/// Map values to 0–255 bytes. Grids whose maximum is ≤ 1 are
/// treated as already normalised and scaled up first.
fn to_byte_range(gray: &GrayFrame) -> Vec<u8> {
    let scale = if gray.max_value() <= 1.0 { 255.0 } else { 1.0 };
    // `as u8` truncates and saturates, so out-of-range values clamp
    gray.as_slice().iter().map(|&v| (v * scale) as u8).collect()
}

/// Median of the four image edges (corners counted once per edge).
fn border_median(bytes: &[u8], height: usize, width: usize) -> f32 {
    let at = |r: usize, c: usize| bytes[r * width + c];

    let mut border: Vec<u8> = Vec::with_capacity(2 * (height + width));
    border.extend((0..width).map(|c| at(0, c)));
    border.extend((0..width).map(|c| at(height - 1, c)));
    border.extend((0..height).map(|r| at(r, 0)));
    border.extend((0..height).map(|r| at(r, width - 1)));

    median(&mut border)
}

/// Median; an even count averages the two middle values.
fn median(values: &mut [u8]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (f32::from(values[mid - 1]) + f32::from(values[mid])) / 2.0
    } else {
        f32::from(values[mid])
    }
}

fn ink_bounds(norm: &[f32], height: usize, width: usize) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for row in 0..height {
        for col in 0..width {
            if norm[row * width + col] <= INK_THRESHOLD {
                continue;
            }
            bounds = Some(match bounds {
                None => (row, row, col, col),
                Some((r0, r1, c0, c1)) => (r0.min(row), r1.max(row), c0.min(col), c1.max(col)),
            });
        }
    }
    bounds
}

/// Crop to `bounds` and centre the crop in a zero-filled square.
/// Returns the square buffer and its side length.
fn pad_to_square(norm: &[f32], width: usize, bounds: Bounds) -> (Vec<f32>, usize) {
    let (r0, r1, c0, c1) = bounds;
    let crop_h = r1 - r0 + 1;
    let crop_w = c1 - c0 + 1;
    let size   = crop_h.max(crop_w);

    let y_off = (size - crop_h) / 2;
    let x_off = (size - crop_w) / 2;

    let mut square = vec![0.0f32; size * size];
    for r in 0..crop_h {
        let src = (r0 + r) * width + c0;
        let dst = (y_off + r) * size + x_off;
        square[dst..dst + crop_w].copy_from_slice(&norm[src..src + crop_w]);
    }
    (square, size)
}

fn resample(square: &[f32], size: usize) -> CanonicalFrame {
    let side = size as u32;
    let img: GrayImage = GrayImage::from_fn(side, side, |x, y| {
        Luma([(square[y as usize * size + x as usize] * 255.0) as u8])
    });

    let target  = FRAME_SIZE as u32;
    let resized = imageops::resize(&img, target, target, FilterType::Lanczos3);

    let pixels = resized.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect();
    CanonicalFrame::from_resampled(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(height: usize, width: usize, fill: f32) -> Vec<f32> {
        vec![fill; height * width]
    }

    fn paint(buf: &mut [f32], width: usize, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>, v: f32) {
        for r in rows {
            for c in cols.clone() {
                buf[r * width + c] = v;
            }
        }
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3, 1, 2]), 2.0);
        assert_eq!(median(&mut [0, 0, 255, 255]), 127.5);
    }

    #[test]
    fn test_border_median_ignores_interior() {
        let mut bytes = vec![255u8; 25];
        // interior 3x3 black does not touch the border
        for r in 1..4 {
            for c in 1..4 {
                bytes[r * 5 + c] = 0;
            }
        }
        assert_eq!(border_median(&bytes, 5, 5), 255.0);
    }

    #[test]
    fn test_pad_puts_odd_remainder_on_trailing_side() {
        // 6 rows x 3 cols of ink inside a 6x6 image
        let mut norm = frame(6, 6, 0.0);
        paint(&mut norm, 6, 0..6, 0..3, 1.0);
        let (square, size) = pad_to_square(&norm, 6, (0, 5, 0, 2));
        assert_eq!(size, 6);
        // x_off = (6 - 3) / 2 = 1 → ink in columns 1..=3
        let row: Vec<f32> = square[0..6].to_vec();
        assert_eq!(row, vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dark_empty_canvas_is_blank() {
        let gray = GrayFrame::from_parts(40, 40, frame(40, 40, 0.0));
        assert!(isolate(&gray).is_blank());
    }

    #[test]
    fn test_white_empty_canvas_is_blank() {
        // inverted to all-zero, so still nothing drawn
        let gray = GrayFrame::from_parts(40, 40, frame(40, 40, 255.0));
        assert!(isolate(&gray).is_blank());
    }

    #[test]
    fn test_faint_uniform_gray_is_blank() {
        let gray = GrayFrame::from_parts(50, 50, frame(50, 50, 30.0));
        assert!(isolate(&gray).is_blank());
    }

    #[test]
    fn test_square_digit_fills_frame() {
        // 5x5 white square away from the centre of a 10x10 black canvas
        let mut data = frame(10, 10, 0.0);
        paint(&mut data, 10, 1..6, 3..8, 255.0);
        let out = isolate(&GrayFrame::from_parts(10, 10, data));

        let (r0, r1, c0, c1) = out.ink_bounds(INK_THRESHOLD).unwrap();
        assert!(r0 <= 1 && c0 <= 1, "ink should start at the frame edge");
        assert!(r1 >= 26 && c1 >= 26, "ink should reach the far edge");
    }

    #[test]
    fn test_tall_stroke_is_centred_horizontally() {
        let mut data = frame(60, 60, 0.0);
        paint(&mut data, 60, 10..30, 40..44, 200.0);
        let out = isolate(&GrayFrame::from_parts(60, 60, data));

        let (r0, r1, c0, c1) = out.ink_bounds(INK_THRESHOLD).unwrap();
        assert!(r0 <= 1 && r1 >= 26, "height should span the frame");
        let centre = (c0 + c1) as f32 / 2.0;
        assert!((centre - 13.5).abs() <= 2.0, "column centre was {centre}");
        assert!(c1 - c0 < 14, "width should keep the aspect ratio");
    }

    #[test]
    fn test_light_background_is_inverted() {
        let mut data = frame(40, 40, 250.0);
        paint(&mut data, 40, 5..35, 18..22, 10.0);
        let out = isolate(&GrayFrame::from_parts(40, 40, data));

        // corners are background → dark; the middle column is ink → bright
        assert!(out.get(0, 0) < 0.1);
        assert!(out.get(14, 14) > 0.5);
    }

    #[test]
    fn test_unit_range_input_is_scaled() {
        let mut data = frame(30, 30, 0.0);
        paint(&mut data, 30, 5..25, 5..25, 1.0);
        let out = isolate(&GrayFrame::from_parts(30, 30, data));
        assert!(out.get(14, 14) > 0.9);
        assert!(out.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
