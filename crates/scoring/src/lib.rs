//! Lead scoring pipeline
//!
//! Features:
//! - Fixed 7-feature derivation shared by training and inference
//! - Heuristic fallback scorer
//! - Random forest classifier with JSON artifact persistence
//! - Score, tier and confidence policy
//! - Conversion rate reporting

pub mod artifacts;
pub mod classifier;
pub mod evaluation;
pub mod features;
pub mod forest;
pub mod heuristic;
pub mod policy;
pub mod predictor;
pub mod report;
pub mod scaler;

pub use artifacts::{ArtifactError, ArtifactPaths, ModelMetadata, MODEL_VERSION};
pub use classifier::{DetailedClassification, LeadClassifier};
pub use evaluation::PerformanceMetrics;
pub use features::{derive_features, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
pub use forest::{ForestParams, RandomForest};
pub use heuristic::heuristic_score;
pub use policy::{classify_probability, confidence_for_score, score_from_probability, status_for_score};
pub use predictor::{
    labels_from_ints, LeadPredictor, ModelSnapshot, TrainingSummary, DEFAULT_RETRAIN_AFTER_DAYS,
    MIN_TRAINING_SAMPLES,
};
pub use report::{ConversionReport, LeadOutcome, TierConversion};
pub use scaler::StandardScaler;

use thiserror::Error;

/// Scoring errors
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Insufficient training data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Got {labels} labels for {samples} samples")]
    LabelMismatch { samples: usize, labels: usize },

    #[error("Invalid label {value} at index {index}, expected 0 or 1")]
    InvalidLabel { index: usize, value: i64 },

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl ScoringError {
    /// True for errors caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ScoringError::Artifact(_))
    }
}
