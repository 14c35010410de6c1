//! Binary classification metrics

use serde::{Deserialize, Serialize};

/// Accuracy, precision and recall for the positive class
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl PerformanceMetrics {
    /// Compare predictions with ground truth
    ///
    /// A zero denominator yields 0.0 for that metric.
    pub fn evaluate(truth: &[u8], predicted: &[u8]) -> Self {
        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t != 0, p != 0) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }

        Self {
            accuracy: ratio(tp + tn, tp + tn + fp + fn_),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let m = PerformanceMetrics::evaluate(&[0, 1, 1, 0], &[0, 1, 1, 0]);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
    }

    #[test]
    fn test_mixed_predictions() {
        // tp=1 fp=1 tn=1 fn=1
        let m = PerformanceMetrics::evaluate(&[1, 0, 0, 1], &[1, 1, 0, 0]);
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.5);
    }

    #[test]
    fn test_no_positive_predictions() {
        let m = PerformanceMetrics::evaluate(&[0, 0, 1], &[0, 0, 0]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert!((m.accuracy - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        assert_eq!(PerformanceMetrics::evaluate(&[], &[]), PerformanceMetrics::default());
    }
}
