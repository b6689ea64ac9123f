// ============================================================
// Layer 3 — PredictionResult Domain Type
// ============================================================
// The structured result of classifying one image:
//   digit         → index of the largest probability
//   confidence    → the probability at that index
//   probabilities → all ten class probabilities
//   label         → the digit as a decimal string

use serde::{Deserialize, Serialize};

use crate::domain::error::{RecognitionError, RecognitionResult};
use crate::domain::NUM_CLASSES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub digit:         u8,
    pub confidence:    f32,
    pub probabilities: Vec<f32>,
    pub label:         String,
}

impl PredictionResult {
    /// Derive a result from one row of classifier output.
    /// Ties resolve to the lowest class index.
    pub fn from_probabilities(probabilities: &[f32]) -> RecognitionResult<Self> {
        if probabilities.len() != NUM_CLASSES {
            return Err(RecognitionError::Inference(format!(
                "expected {NUM_CLASSES} class probabilities, got {}",
                probabilities.len()
            )));
        }

        let (digit, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (i, p)| {
                if p > best.1 { (i, p) } else { best }
            });

        Ok(Self {
            digit: digit as u8,
            confidence,
            probabilities: probabilities.to_vec(),
            label: digit.to_string(),
        })
    }

    /// Sum of the distribution; ≈ 1 for a softmax output.
    pub fn probability_mass(&self) -> f32 {
        self.probabilities.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_and_label() {
        let mut probs = vec![0.02; NUM_CLASSES];
        probs[7] = 0.82;
        let r = PredictionResult::from_probabilities(&probs).unwrap();
        assert_eq!(r.digit, 7);
        assert_eq!(r.label, "7");
        assert!((r.confidence - 0.82).abs() < 1e-6);
        assert!((r.probability_mass() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ties_pick_first_class() {
        let probs = vec![0.1; NUM_CLASSES];
        let r = PredictionResult::from_probabilities(&probs).unwrap();
        assert_eq!(r.digit, 0);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let err = PredictionResult::from_probabilities(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, RecognitionError::Inference(_)));
    }
}
