// ============================================================
// Layer 4 — Digit Batcher
// ============================================================
// Implements Burn's Batcher trait to stack LabeledImages into
// the tensors the CNN consumes.
//
//   Input:  Vec of N LabeledImages (784 bytes + label each)
//   Output: DigitBatch
//             images  [N, 1, 28, 28]  float, scaled to [0, 1]
//             targets [N]             int class indices
//
// Every image is already 28×28, so batching is a flatten and
// a reshape; no padding is needed.
//
// Reference: Burn Book §4 (Batcher)

use std::marker::PhantomData;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::LabeledImage;
use crate::domain::FRAME_SIZE;

#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Pixel intensities — shape: [batch_size, 1, 28, 28]
    pub images: Tensor<B, 4>,

    /// Ground-truth digits — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Stateless; the DataLoader supplies the device per batch.
#[derive(Clone, Debug, Default)]
pub struct DigitBatcher<B: Backend> {
    _backend: PhantomData<B>,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<B: Backend> Batcher<B, LabeledImage, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<LabeledImage>, device: &B::Device) -> DigitBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.normalized())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), device)
            .reshape([batch_size, 1, FRAME_SIZE, FRAME_SIZE]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device);

        DigitBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FRAME_PIXELS;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_scaling() {
        let device = Default::default();
        let items = vec![
            LabeledImage::new(vec![255; FRAME_PIXELS], 4),
            LabeledImage::new(vec![0; FRAME_PIXELS], 2),
        ];
        let batch = DigitBatcher::<TestBackend>::new().batch(items, &device);

        assert_eq!(batch.images.dims(), [2, 1, 28, 28]);
        assert_eq!(batch.targets.dims(), [2]);

        let max: f32 = batch.images.clone().max().into_scalar().elem();
        let min: f32 = batch.images.min().into_scalar().elem();
        assert_eq!(max, 1.0);
        assert_eq!(min, 0.0);
    }
}
