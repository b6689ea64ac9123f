// ============================================================
// Layer 4 — Image Codec
// ============================================================
// Byte-level conversions at the edges of the pipeline:
//
//   base64 text / data URL  → raw bytes
//   encoded bytes (PNG,…)   → single-channel GrayFrame (0–255)
//   8-bit grayscale pixels  → PNG bytes → base64 text
//
// Canvas exports arrive as `data:image/png;base64,<payload>`;
// everything up to and including the first comma is dropped.

use std::io::Cursor;

use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use image::{GrayImage, ImageFormat};

use crate::domain::error::{RecognitionError, RecognitionResult};
use crate::domain::image::GrayFrame;

/// Standard alphabet; accepts payloads with or without `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DATA_URL_SCHEME: &str = "data:";

/// Return the base64 payload of a data URL, or the trimmed text unchanged.
pub fn strip_data_url(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with(DATA_URL_SCHEME) {
        text.split_once(',').map_or(text, |(_, payload)| payload)
    } else {
        text
    }
}

pub fn decode_base64_text(text: &str) -> RecognitionResult<Vec<u8>> {
    let payload: String = strip_data_url(text)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(LENIENT.decode(payload)?)
}

/// Decode any supported image format and reduce it to luma.
pub fn decode_image_bytes(bytes: &[u8]) -> RecognitionResult<GrayFrame> {
    let luma = image::load_from_memory(bytes)?.to_luma8();
    let (width, height) = luma.dimensions();
    let data = luma.into_raw().into_iter().map(f32::from).collect();
    Ok(GrayFrame::from_parts(height as usize, width as usize, data))
}

pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> RecognitionResult<Vec<u8>> {
    let img = GrayImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        RecognitionError::InvalidShape(format!(
            "{} bytes do not form a {width}x{height} image",
            pixels.len()
        ))
    })?;

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

pub fn encode_png_base64(pixels: &[u8], width: u32, height: u32) -> RecognitionResult<String> {
    Ok(STANDARD.encode(encode_png(pixels, width, height)?))
}
