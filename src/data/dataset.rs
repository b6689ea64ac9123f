use burn::data::dataset::Dataset;

use crate::domain::sample::LabeledImage;

/// In-memory collection of labelled digits, indexable by burn's DataLoader.
pub struct DigitDataset {
    samples: Vec<LabeledImage>,
}

impl DigitDataset {
    pub fn new(samples: Vec<LabeledImage>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Number of samples per class, indexed by digit.
    pub fn class_counts(&self) -> [usize; 10] {
        let mut counts = [0usize; 10];
        for s in &self.samples {
            counts[s.label as usize] += 1;
        }
        counts
    }
}

impl Dataset<LabeledImage> for DigitDataset {
    fn get(&self, index: usize) -> Option<LabeledImage> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
