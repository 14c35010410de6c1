//! Classification policy
//!
//! Maps a conversion probability to an integer score, a status tier and a
//! confidence value.

use lead_qualifier_core::{ClassificationResult, LeadStatus};

/// Lowest score classified as Hot
pub const HOT_THRESHOLD: u8 = 80;
/// Lowest score classified as Warm
pub const WARM_THRESHOLD: u8 = 50;

pub const MIN_CONFIDENCE: f64 = 0.6;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// `round(p * 100)` with ties to even; p is clamped to `[0, 1]`, NaN reads as 0
pub fn score_from_probability(probability: f64) -> u8 {
    let p = if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    };
    (p * 100.0).round_ties_even() as u8
}

pub fn status_for_score(score: u8) -> LeadStatus {
    if score >= HOT_THRESHOLD {
        LeadStatus::Hot
    } else if score >= WARM_THRESHOLD {
        LeadStatus::Warm
    } else {
        LeadStatus::Cold
    }
}

/// Grows with the distance of the score from its tier's lower threshold
pub fn confidence_for_score(score: u8) -> f64 {
    let threshold = match status_for_score(score) {
        LeadStatus::Hot => HOT_THRESHOLD,
        LeadStatus::Warm => WARM_THRESHOLD,
        LeadStatus::Cold => 0,
    };
    let distance = f64::from(score.abs_diff(threshold));
    (MIN_CONFIDENCE + distance / 100.0).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

pub fn classify_probability(probability: f64) -> ClassificationResult {
    let score = score_from_probability(probability);
    ClassificationResult {
        status: status_for_score(score),
        score,
        confidence: confidence_for_score(score),
    }
}
