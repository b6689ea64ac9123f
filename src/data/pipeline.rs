// ============================================================
// Layer 4 — Preprocessing Pipeline
// ============================================================
// The single entry point from "whatever the caller sent" to
// the canonical 28×28 frame:
//
//   Base64Text ──► strip data URL ──► decode base64 ─┐
//                                                    ▼
//   EncodedBytes ─────────────────► decode image ──► GrayFrame
//                                                    ▲
//   RawGrid ──────────────────────► to_grayscale ────┘
//                                                    │
//              28×28? ── yes ──► rescale if > 1 ─────┤
//                 │                                  ▼
//                 └─ no ──► Digit Isolator ──► CanonicalFrame
//
// Decode failures propagate; nothing is guessed or degraded.

use crate::data::codec::{decode_base64_text, decode_image_bytes};
use crate::data::grayscale::to_grayscale;
use crate::data::isolator::isolate;
use crate::domain::error::RecognitionResult;
use crate::domain::image::{CanonicalFrame, GrayFrame, ImageInput};
use crate::domain::FRAME_SIZE;

#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Convert any supported input into a 28×28 frame in [0, 1].
    pub fn preprocess(&self, image: ImageInput) -> RecognitionResult<CanonicalFrame> {
        let gray = match image {
            ImageInput::Base64Text(text) => decode_image_bytes(&decode_base64_text(&text)?)?,
            ImageInput::EncodedBytes(bytes) => decode_image_bytes(&bytes)?,
            ImageInput::RawGrid(grid) => to_grayscale(&grid),
        };
        self.normalize(gray)
    }

    fn normalize(&self, gray: GrayFrame) -> RecognitionResult<CanonicalFrame> {
        if gray.shape() != (FRAME_SIZE, FRAME_SIZE) {
            tracing::debug!("Isolating digit in {}x{} input", gray.height(), gray.width());
            return Ok(isolate(&gray));
        }

        // Fast path: already dataset-shaped, only the value range may differ
        let scale = if gray.max_value() > 1.0 { 255.0 } else { 1.0 };
        let pixels = gray.into_vec().into_iter().map(|v| v / scale).collect();
        CanonicalFrame::from_pixels(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::codec::encode_png_base64;
    use crate::data::isolator::INK_THRESHOLD;
    use crate::domain::image::PixelGrid;
    use crate::domain::FRAME_PIXELS;

    fn digit_bytes() -> Vec<u8> {
        // bright "1"-like bar with a foot, on black, rows 4..24, cols 10..18
        let mut px = vec![0u8; FRAME_PIXELS];
        for r in 4..24 {
            for c in 12..16 {
                px[r * FRAME_SIZE + c] = 255;
            }
        }
        for c in 10..18 {
            px[23 * FRAME_SIZE + c] = 255;
        }
        px
    }

    #[test]
    fn test_fast_path_rescales_bytes() {
        let data: Vec<f32> = digit_bytes().into_iter().map(f32::from).collect();
        let grid = PixelGrid::gray(FRAME_SIZE, FRAME_SIZE, data).unwrap();
        let out = Preprocessor::new().preprocess(grid.into()).unwrap();
        assert_eq!(out.shape(), (28, 28));
        assert_eq!(out.get(10, 13), 1.0);
        assert_eq!(out.get(0, 0), 0.0);
    }

    #[test]
    fn test_fast_path_is_idempotent_in_range() {
        let data: Vec<f32> = (0..FRAME_PIXELS).map(|i| (i % 7) as f32 / 7.0).collect();
        let grid = PixelGrid::gray(FRAME_SIZE, FRAME_SIZE, data.clone()).unwrap();
        let out = Preprocessor::new().preprocess(grid.into()).unwrap();
        assert_eq!(out.as_slice(), data.as_slice());
    }

    #[test]
    fn test_large_uniform_input_is_blank() {
        let grid = PixelGrid::gray(64, 64, vec![20.0; 64 * 64]).unwrap();
        let out = Preprocessor::new().preprocess(grid.into()).unwrap();
        assert!(out.is_blank());
    }

    #[test]
    fn test_rgba_canvas_goes_through_isolator() {
        // white opaque canvas, black stroke
        let (h, w) = (50, 40);
        let mut data = Vec::with_capacity(h * w * 4);
        for r in 0..h {
            for c in 0..w {
                let v = if (10..40).contains(&r) && (18..22).contains(&c) { 0.0 } else { 255.0 };
                data.extend_from_slice(&[v, v, v, 255.0]);
            }
        }
        let grid = PixelGrid::new(h, w, 4, data).unwrap();
        let out = Preprocessor::new().preprocess(grid.into()).unwrap();
        // inverted: bright stroke in the middle, dark corners
        assert!(out.get(14, 14) > 0.5);
        assert!(out.get(0, 0) < 0.1);
    }

    #[test]
    fn test_png_base64_roundtrip_preserves_box_and_polarity() {
        let bytes = digit_bytes();
        let b64 = encode_png_base64(&bytes, FRAME_SIZE as u32, FRAME_SIZE as u32).unwrap();
        let data_url = format!("data:image/png;base64,{b64}");

        for text in [b64, data_url] {
            let out = Preprocessor::new().preprocess(ImageInput::Base64Text(text)).unwrap();
            assert_eq!(out.ink_bounds(INK_THRESHOLD), Some((4, 23, 10, 17)));
            assert_eq!(out.get(0, 0), 0.0);
            assert_eq!(out.get(12, 13), 1.0);
        }
    }

    #[test]
    fn test_encoded_bytes_of_light_canvas_are_inverted() {
        let (h, w) = (56u32, 56u32);
        let mut px = vec![240u8; (h * w) as usize];
        for r in 8..48 {
            for c in 26..30 {
                px[r * w as usize + c] = 15;
            }
        }
        let png = crate::data::codec::encode_png(&px, w, h).unwrap();
        let out = Preprocessor::new().preprocess(ImageInput::EncodedBytes(png)).unwrap();
        assert!(out.get(14, 14) > 0.5);
        assert!(out.get(27, 0) < 0.1);
    }

    #[test]
    fn test_bad_base64_propagates() {
        let err = Preprocessor::new()
            .preprocess(ImageInput::Base64Text("data:image/png;base64,%%%".into()))
            .unwrap_err();
        assert!(err.is_decode_error());
    }
}
