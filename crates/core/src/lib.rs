//! Core traits and types for lead qualification
//!
//! This crate provides foundational types used across all other crates:
//! - Lead entity and webhook intake payload
//! - Engagement metrics
//! - Classification outcome types
//! - Traits for pluggable estimators and CRM backends
//! - Error types

pub mod classification;
pub mod engagement;
pub mod error;
pub mod lead;
pub mod traits;

pub use classification::{ClassificationResult, LeadStatus};
pub use engagement::EngagementMetrics;
pub use error::{IntegrationError, LeadError};
pub use lead::{is_valid_email, Lead, LeadIntake, NewLead, DEFAULT_SOURCE};
pub use traits::{ConversionEstimator, CrmAdapter, EstimateSource};
