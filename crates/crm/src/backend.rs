//! Backend selection
//!
//! The configured backend is chosen once at startup.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use lead_qualifier_config::{CrmConfig, CrmKind};
use lead_qualifier_core::{CrmAdapter, IntegrationError, Lead};

use crate::hubspot::HubSpotClient;
use crate::salesforce::SalesforceClient;
use crate::stub::StubCrm;

pub enum CrmBackend {
    HubSpot(HubSpotClient),
    Salesforce(SalesforceClient),
    Stub(StubCrm),
}

impl CrmBackend {
    pub fn from_config(config: &CrmConfig) -> Result<Self, IntegrationError> {
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let backend = match config.kind {
            CrmKind::HubSpot => CrmBackend::HubSpot(HubSpotClient::new(&config.hubspot, timeout)?),
            CrmKind::Salesforce => {
                CrmBackend::Salesforce(SalesforceClient::new(&config.salesforce, timeout)?)
            }
            CrmKind::Stub => CrmBackend::Stub(StubCrm::new()),
        };
        tracing::info!(crm = backend.name(), "CRM backend selected");
        Ok(backend)
    }

    pub fn kind(&self) -> CrmKind {
        match self {
            CrmBackend::HubSpot(_) => CrmKind::HubSpot,
            CrmBackend::Salesforce(_) => CrmKind::Salesforce,
            CrmBackend::Stub(_) => CrmKind::Stub,
        }
    }

    fn adapter(&self) -> &dyn CrmAdapter {
        match self {
            CrmBackend::HubSpot(c) => c,
            CrmBackend::Salesforce(c) => c,
            CrmBackend::Stub(c) => c,
        }
    }
}

#[async_trait]
impl CrmAdapter for CrmBackend {
    fn name(&self) -> &'static str {
        self.adapter().name()
    }

    async fn update_lead(&self, lead: &Lead) -> Result<(), IntegrationError> {
        self.adapter().update_lead(lead).await
    }

    async fn get_lead(&self, email: &str) -> Result<Option<Value>, IntegrationError> {
        self.adapter().get_lead(email).await
    }

    async fn create_task(&self, lead: &Lead) -> Result<(), IntegrationError> {
        self.adapter().create_task(lead).await
    }
}
