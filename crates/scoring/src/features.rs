//! Feature Layout and Derivation
//!
//! Converts raw engagement counters into the fixed-length vector consumed by
//! the scaler and the forest. Training and inference both go through
//! [`derive_features`], so the two paths always agree on layout.
//!
//! Changing [`FEATURE_LAYOUT`] invalidates persisted artifacts: the scaler
//! records the layout it was fitted on and is rejected at load time when it
//! differs.

use lead_qualifier_core::EngagementMetrics;

/// Feature names in the exact order they appear in the vector
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    // === Raw counters (0-4) ===
    "website_visits",       // 0
    "time_on_site",         // 1: seconds
    "pages_viewed",         // 2
    "downloaded_resources", // 3
    "email_interactions",   // 4
    // === Derived (5-6) ===
    "engagement_rate",      // 5: pages per visit
    "avg_time_per_visit",   // 6: seconds per visit
];

/// Total number of features
pub const FEATURE_COUNT: usize = 7;

/// Ordered feature vector
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Build the feature vector for one lead
///
/// Both ratios divide by `max(website_visits, 1)`: zero visits with five
/// pages viewed yields an engagement rate of 5, never infinity or NaN.
pub fn derive_features(metrics: &EngagementMetrics) -> FeatureVector {
    let visits = f64::from(metrics.website_visits);
    let time = f64::from(metrics.time_on_site);
    let pages = f64::from(metrics.pages_viewed);
    let denominator = visits.max(1.0);

    [
        visits,
        time,
        pages,
        f64::from(metrics.downloaded_resources),
        f64::from(metrics.email_interactions),
        pages / denominator,
        time / denominator,
    ]
}

/// Index of a feature by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|n| *n == name)
}

/// Check a persisted layout against the current one
pub fn layout_matches<S: AsRef<str>>(names: &[S]) -> bool {
    names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_LAYOUT.iter())
            .all(|(a, b)| a.as_ref() == *b)
}
