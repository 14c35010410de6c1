//! Classification outcome types

use serde::{Deserialize, Serialize};

/// Lead status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    /// High conversion likelihood, follow up immediately
    Hot,
    /// Moderate conversion likelihood
    Warm,
    /// Low conversion likelihood
    #[default]
    Cold,
}

impl LeadStatus {
    /// All tiers, hottest first
    pub const ALL: [LeadStatus; 3] = [LeadStatus::Hot, LeadStatus::Warm, LeadStatus::Cold];

    /// Display name ("Hot", "Warm", "Cold")
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Hot => "Hot",
            LeadStatus::Warm => "Warm",
            LeadStatus::Cold => "Cold",
        }
    }

    /// Lower-case name, as some CRMs expect
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            LeadStatus::Hot => "hot",
            LeadStatus::Warm => "warm",
            LeadStatus::Cold => "cold",
        }
    }

    pub fn is_hot(&self) -> bool {
        matches!(self, LeadStatus::Hot)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one lead
///
/// Produced once per lead and folded into it via [`crate::Lead::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Status tier derived from the score
    pub status: LeadStatus,
    /// Integer score in [0, 100]
    pub score: u8,
    /// Confidence in [0.6, 0.95]
    pub confidence: f64,
}
