//! Core traits for the lead qualification system
//!
//! ```text
//! Scoring:
//!   - ConversionEstimator: EngagementMetrics → conversion probability
//!
//! Delivery:
//!   - CrmAdapter: push a classified Lead into an external CRM
//! ```

mod crm;
mod estimator;

pub use crm::CrmAdapter;
pub use estimator::{ConversionEstimator, EstimateSource};
