//! Heuristic Scorer
//!
//! Rule-based conversion probability used until a model has been trained.

use lead_qualifier_core::EngagementMetrics;

/// Saturation caps, in layout order
/// (visits, seconds on site, pages, downloads, email interactions)
pub const METRIC_CAPS: [f64; 5] = [10.0, 300.0, 5.0, 2.0, 3.0];

/// Weights, in layout order; they sum to 1.0
pub const METRIC_WEIGHTS: [f64; 5] = [0.20, 0.20, 0.20, 0.25, 0.15];

/// Conversion probability in `[0, 1]` from capped metric ratios
///
/// Each counter is divided by its cap and clamped to 1, then the weighted
/// sum is taken. Deterministic and free of external state.
pub fn heuristic_score(metrics: &EngagementMetrics) -> f64 {
    let score: f64 = metrics
        .raw()
        .iter()
        .zip(METRIC_CAPS.iter())
        .zip(METRIC_WEIGHTS.iter())
        .map(|((value, cap), weight)| (f64::from(*value) / cap).min(1.0) * weight)
        .sum();

    // Float summation of the weights can land a hair above 1.0
    score.clamp(0.0, 1.0)
}
