//! HubSpot CRM v3 client
//!
//! Contacts are upserted by email. Hot leads also get a follow-up task.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Map, Value};

use lead_qualifier_config::HubSpotConfig;
use lead_qualifier_core::{CrmAdapter, IntegrationError, Lead};

use crate::http::{build_client, check, transport_error};

pub struct HubSpotClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl HubSpotClient {
    pub fn new(config: &HubSpotConfig, timeout: Duration) -> Result<Self, IntegrationError> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| IntegrationError::NotConfigured("HubSpot access token".to_string()))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            IntegrationError::NotConfigured(format!("HubSpot base URL {}: {}", config.base_url, e))
        })?;

        Ok(Self {
            client: build_client(timeout)?,
            base_url,
            access_token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, IntegrationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IntegrationError::Internal("HubSpot base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Contact id for an email, `None` when HubSpot has no such contact
    async fn find_contact(&self, email: &str) -> Result<Option<Value>, IntegrationError> {
        let url = self.endpoint(&["crm", "v3", "objects", "contacts", email])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("idProperty", "email")])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let contact: Value = check(response).await?.json().await.map_err(transport_error)?;
        Ok(Some(contact))
    }
}

/// Contact properties written on every upsert
pub fn contact_properties(lead: &Lead) -> Map<String, Value> {
    let metrics = lead.engagement_metrics();
    let mut properties = Map::new();
    properties.insert("email".into(), lead.email().into());
    properties.insert("firstname".into(), lead.first_name().into());
    properties.insert("lastname".into(), lead.last_name().into());
    if let Some(company) = lead.company() {
        properties.insert("company".into(), company.into());
    }
    properties.insert("lead_source".into(), lead.source().into());
    properties.insert("lead_score".into(), lead.score().to_string().into());
    properties.insert("lead_status".into(), lead.status().as_lowercase().into());
    properties.insert("website_visits".into(), metrics.website_visits.to_string().into());
    properties.insert("time_on_site".into(), metrics.time_on_site.to_string().into());
    properties.insert("pages_viewed".into(), metrics.pages_viewed.to_string().into());
    properties.insert(
        "downloaded_resources".into(),
        metrics.downloaded_resources.to_string().into(),
    );
    properties.insert(
        "email_interactions".into(),
        metrics.email_interactions.to_string().into(),
    );
    properties
}

/// Follow-up task properties, due at lead creation
pub fn task_properties(lead: &Lead) -> Value {
    json!({
        "hs_task_subject": format!("Follow up with {} (Hot Lead)", lead.name()),
        "hs_task_priority": "HIGH",
        "hs_task_status": "NOT_STARTED",
        "hs_task_type": "SALES_OUTREACH",
        "hs_timestamp": lead.created_at().timestamp_millis().to_string(),
    })
}

#[async_trait]
impl CrmAdapter for HubSpotClient {
    fn name(&self) -> &'static str {
        "hubspot"
    }

    async fn update_lead(&self, lead: &Lead) -> Result<(), IntegrationError> {
        let body = json!({ "properties": contact_properties(lead) });

        let existing_id = self
            .find_contact(lead.email())
            .await?
            .and_then(|c| c.get("id").and_then(Value::as_str).map(str::to_string));

        let request = match &existing_id {
            Some(id) => self
                .client
                .patch(self.endpoint(&["crm", "v3", "objects", "contacts", id])?),
            None => self
                .client
                .post(self.endpoint(&["crm", "v3", "objects", "contacts"])?),
        };

        let response = request
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await?;

        tracing::info!(
            lead_id = %lead.id(),
            updated = existing_id.is_some(),
            "HubSpot contact upserted"
        );

        if lead.status().is_hot() {
            if let Err(e) = self.create_task(lead).await {
                tracing::warn!(lead_id = %lead.id(), error = %e, "HubSpot follow-up task failed");
            }
        }

        Ok(())
    }

    async fn get_lead(&self, email: &str) -> Result<Option<Value>, IntegrationError> {
        Ok(self
            .find_contact(email)
            .await?
            .map(|contact| contact.get("properties").cloned().unwrap_or(contact)))
    }

    async fn create_task(&self, lead: &Lead) -> Result<(), IntegrationError> {
        let response = self
            .client
            .post(self.endpoint(&["crm", "v3", "objects", "tasks"])?)
            .bearer_auth(&self.access_token)
            .json(&json!({ "properties": task_properties(lead) }))
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await?;

        tracing::info!(lead_id = %lead.id(), "HubSpot follow-up task created");
        Ok(())
    }
}
