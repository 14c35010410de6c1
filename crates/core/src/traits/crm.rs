//! CRM delivery capability

use async_trait::async_trait;

use crate::error::IntegrationError;
use crate::lead::Lead;

/// Delivers finalized leads to an external CRM
///
/// Implement this trait to integrate with a CRM system
/// (e.g., HubSpot, Salesforce).
#[async_trait]
pub trait CrmAdapter: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Create or update the lead in the CRM
    ///
    /// Hot leads also get a follow-up task.
    async fn update_lead(&self, lead: &Lead) -> Result<(), IntegrationError>;

    /// Fetch the CRM's record for an email address
    async fn get_lead(&self, email: &str) -> Result<Option<serde_json::Value>, IntegrationError>;

    /// Create a follow-up task for the lead
    async fn create_task(&self, lead: &Lead) -> Result<(), IntegrationError>;
}
