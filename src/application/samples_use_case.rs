// ============================================================
// Layer 2 — Samples Use Case
// ============================================================
// Picks random training images and returns them as base64
// PNGs, e.g. to show a user what the model was trained on.

use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::data::codec::encode_png_base64;
use crate::data::mnist::MnistLoader;
use crate::domain::sample::{LabeledImage, Split};
use crate::domain::traits::DigitSource;
use crate::domain::{FRAME_SIZE, NUM_CLASSES};

#[derive(Debug, Clone, Serialize)]
pub struct SampleImage {
    pub image_base64: String,
    pub label:        u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleGallery {
    pub samples: Vec<SampleImage>,
}

pub struct SamplesUseCase {
    data_dir: String,
}

impl SamplesUseCase {
    pub fn new(data_dir: String) -> Self {
        Self { data_dir }
    }

    pub fn execute(&self, count: usize, digit: Option<u8>) -> Result<SampleGallery> {
        self.execute_with(&MnistLoader::new(&self.data_dir), count, digit)
    }

    /// Up to `count` distinct images, optionally only of `digit`.
    pub fn execute_with(
        &self,
        source: &dyn DigitSource,
        count:  usize,
        digit:  Option<u8>,
    ) -> Result<SampleGallery> {
        if let Some(d) = digit {
            ensure!(usize::from(d) < NUM_CLASSES, "digit must be 0-9, got {d}");
        }

        let images = source.load_split(Split::Train)?;
        let pool: Vec<&LabeledImage> = images
            .iter()
            .filter(|img| digit.map_or(true, |d| img.label == d))
            .collect();

        let mut rng = rand::thread_rng();
        let samples = pool
            .choose_multiple(&mut rng, count)
            .map(|img| -> Result<SampleImage> {
                Ok(SampleImage {
                    image_base64: encode_png_base64(&img.pixels, FRAME_SIZE as u32, FRAME_SIZE as u32)?,
                    label:        img.label,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Picked {} of {} candidate samples", samples.len(), pool.len());
        Ok(SampleGallery { samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::codec::{decode_base64_text, decode_image_bytes};
    use crate::domain::FRAME_PIXELS;

    struct TenDigits;

    impl DigitSource for TenDigits {
        fn load_split(&self, _split: Split) -> Result<Vec<LabeledImage>> {
            Ok((0..30u8).map(|i| LabeledImage::new(vec![i; FRAME_PIXELS], i % 10)).collect())
        }
    }

    fn use_case() -> SamplesUseCase {
        SamplesUseCase::new("unused".into())
    }

    #[test]
    fn test_count_is_capped_by_pool() {
        let gallery = use_case().execute_with(&TenDigits, 50, None).unwrap();
        assert_eq!(gallery.samples.len(), 30);

        let gallery = use_case().execute_with(&TenDigits, 5, None).unwrap();
        assert_eq!(gallery.samples.len(), 5);
    }

    #[test]
    fn test_digit_filter() {
        let gallery = use_case().execute_with(&TenDigits, 10, Some(7)).unwrap();
        assert_eq!(gallery.samples.len(), 3);
        assert!(gallery.samples.iter().all(|s| s.label == 7));
    }

    #[test]
    fn test_images_decode_as_28x28_png() {
        let gallery = use_case().execute_with(&TenDigits, 1, None).unwrap();
        let bytes = decode_base64_text(&gallery.samples[0].image_base64).unwrap();
        let frame = decode_image_bytes(&bytes).unwrap();
        assert_eq!(frame.shape(), (FRAME_SIZE, FRAME_SIZE));
    }

    #[test]
    fn test_rejects_out_of_range_digit() {
        assert!(use_case().execute_with(&TenDigits, 1, Some(10)).is_err());
    }
}
