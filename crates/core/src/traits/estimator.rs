//! Conversion probability estimation

use serde::{Deserialize, Serialize};

use crate::engagement::EngagementMetrics;

/// Which path produced a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// A trained model was loaded
    Model,
    /// Rule-based fallback, no model available
    Heuristic,
}

impl EstimateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateSource::Model => "model",
            EstimateSource::Heuristic => "heuristic",
        }
    }
}

/// Estimates the probability that a lead converts
///
/// Implementations must be total over well-formed metrics and return a
/// value in `[0, 1]`.
pub trait ConversionEstimator: Send + Sync {
    /// Probability of conversion together with the path that produced it
    fn estimate(&self, metrics: &EngagementMetrics) -> (f64, EstimateSource);

    /// Probability of conversion
    fn conversion_probability(&self, metrics: &EngagementMetrics) -> f64 {
        self.estimate(metrics).0
    }
}
