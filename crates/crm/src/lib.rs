//! CRM integration for qualified leads
//!
//! - HubSpot v3 contacts and tasks
//! - Salesforce REST with the OAuth2 password flow
//! - Stub backend for development and testing
//! - Bounded background delivery queue

pub mod backend;
mod http;
pub mod hubspot;
pub mod queue;
pub mod salesforce;
pub mod stub;

pub use backend::CrmBackend;
pub use hubspot::HubSpotClient;
pub use queue::{DeliveryQueue, DeliveryStats, EnqueueOutcome};
pub use salesforce::SalesforceClient;
pub use stub::StubCrm;

pub use lead_qualifier_core::{CrmAdapter, IntegrationError};
