//! Stub CRM for development and testing
//!
//! Logs every call and succeeds without contacting a real CRM.

use async_trait::async_trait;
use serde_json::{json, Value};

use lead_qualifier_core::{CrmAdapter, IntegrationError, Lead};

#[derive(Debug, Default, Clone, Copy)]
pub struct StubCrm;

impl StubCrm {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CrmAdapter for StubCrm {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn update_lead(&self, lead: &Lead) -> Result<(), IntegrationError> {
        tracing::info!(
            lead_id = %lead.id(),
            status = %lead.status(),
            score = lead.score(),
            "Stub CRM: Updated lead"
        );
        if lead.status().is_hot() {
            self.create_task(lead).await?;
        }
        Ok(())
    }

    async fn get_lead(&self, email: &str) -> Result<Option<Value>, IntegrationError> {
        tracing::info!(email = %email, "Stub CRM: Get lead");
        Ok(Some(json!({ "email": email })))
    }

    async fn create_task(&self, lead: &Lead) -> Result<(), IntegrationError> {
        tracing::info!(lead_id = %lead.id(), "Stub CRM: Created follow-up task");
        Ok(())
    }
}
