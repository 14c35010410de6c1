//! Salesforce REST client
//!
//! Authenticates with the OAuth2 username-password flow and caches the
//! session until Salesforce rejects it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use lead_qualifier_config::SalesforceConfig;
use lead_qualifier_core::{CrmAdapter, IntegrationError, Lead};

use crate::http::{build_client, check, transport_error};

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
    security_token: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Session {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "totalSize")]
    total_size: usize,
    #[serde(default)]
    records: Vec<Value>,
}

pub struct SalesforceClient {
    client: Client,
    login_url: String,
    api_version: String,
    credentials: Credentials,
    session: Mutex<Option<Session>>,
}

fn required(value: &Option<String>, name: &str) -> Result<String, IntegrationError> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IntegrationError::NotConfigured(format!("Salesforce {}", name)))
}

/// Quote a string literal for SOQL
pub fn soql_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Lead fields written on every upsert
pub fn lead_fields(lead: &Lead) -> Value {
    let metrics = lead.engagement_metrics();
    json!({
        "Email": lead.email(),
        "FirstName": lead.first_name(),
        "LastName": lead.last_name(),
        "Company": lead.company(),
        "LeadSource": lead.source(),
        "Rating": lead.status().as_str(),
        "Lead_Score__c": lead.score(),
        "Website_Visits__c": metrics.website_visits,
        "Time_On_Site__c": metrics.time_on_site,
        "Pages_Viewed__c": metrics.pages_viewed,
        "Downloaded_Resources__c": metrics.downloaded_resources,
        "Email_Interactions__c": metrics.email_interactions,
    })
}

pub fn task_fields(lead: &Lead, who_id: &str) -> Value {
    json!({
        "Subject": format!("Follow up with {} (Hot Lead)", lead.name()),
        "Priority": "High",
        "Status": "Not Started",
        "WhoId": who_id,
        "Type": "Call",
    })
}

impl SalesforceClient {
    pub fn new(config: &SalesforceConfig, timeout: Duration) -> Result<Self, IntegrationError> {
        let credentials = Credentials {
            username: required(&config.username, "username")?,
            password: required(&config.password, "password")?,
            security_token: config.security_token.clone().unwrap_or_default(),
            client_id: required(&config.client_id, "client_id")?,
            client_secret: required(&config.client_secret, "client_secret")?,
        };

        Ok(Self {
            client: build_client(timeout)?,
            login_url: config.login_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            credentials,
            session: Mutex::new(None),
        })
    }

    async fn authenticate(&self) -> Result<Session, IntegrationError> {
        let creds = &self.credentials;
        let password = format!("{}{}", creds.password, creds.security_token);
        let response = self
            .client
            .post(format!("{}/services/oauth2/token", self.login_url))
            .form(&[
                ("grant_type", "password"),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("username", creds.username.as_str()),
                ("password", password.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::AuthFailed(format!("HTTP {}: {}", status, body)));
        }

        let session: Session = response.json().await.map_err(transport_error)?;
        tracing::info!(instance_url = %session.instance_url, "Salesforce session established");
        Ok(session)
    }

    async fn session(&self) -> Result<Session, IntegrationError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let session = self.authenticate().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Send an authenticated request, dropping the cached session on 401
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, IntegrationError>
    where
        F: Fn(&Session) -> RequestBuilder,
    {
        let session = self.session().await?;
        let response = build(&session)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.lock().await.take();
            tracing::warn!("Salesforce session rejected, will re-authenticate on next call");
        }
        check(response).await
    }

    fn data_url(&self, session: &Session, path: &str) -> String {
        format!(
            "{}/services/data/{}/{}",
            session.instance_url.trim_end_matches('/'),
            self.api_version,
            path
        )
    }

    async fn query(&self, soql: &str) -> Result<QueryResponse, IntegrationError> {
        let response = self
            .send(|s| self.client.get(self.data_url(s, "query")).query(&[("q", soql)]))
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn find_lead_id(&self, email: &str) -> Result<Option<String>, IntegrationError> {
        let result = self
            .query(&format!("SELECT Id FROM Lead WHERE Email = {}", soql_quote(email)))
            .await?;
        Ok(result
            .records
            .first()
            .and_then(|r| r.get("Id"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait]
impl CrmAdapter for SalesforceClient {
    fn name(&self) -> &'static str {
        "salesforce"
    }

    async fn update_lead(&self, lead: &Lead) -> Result<(), IntegrationError> {
        let fields = lead_fields(lead);
        let existing = self.find_lead_id(lead.email()).await?;

        match &existing {
            Some(id) => {
                let path = format!("sobjects/Lead/{}", id);
                self.send(|s| self.client.patch(self.data_url(s, &path)).json(&fields))
                    .await?;
            }
            None => {
                self.send(|s| self.client.post(self.data_url(s, "sobjects/Lead")).json(&fields))
                    .await?;
            }
        }

        tracing::info!(
            lead_id = %lead.id(),
            updated = existing.is_some(),
            "Salesforce lead upserted"
        );

        if lead.status().is_hot() {
            if let Err(e) = self.create_task(lead).await {
                tracing::warn!(lead_id = %lead.id(), error = %e, "Salesforce follow-up task failed");
            }
        }

        Ok(())
    }

    async fn get_lead(&self, email: &str) -> Result<Option<Value>, IntegrationError> {
        let result = self
            .query(&format!(
                "SELECT Id, FirstName, LastName, Company, Rating, Lead_Score__c FROM Lead WHERE Email = {}",
                soql_quote(email)
            ))
            .await?;
        if result.total_size == 0 {
            return Ok(None);
        }
        Ok(result.records.into_iter().next())
    }

    async fn create_task(&self, lead: &Lead) -> Result<(), IntegrationError> {
        let who_id = self
            .find_lead_id(lead.email())
            .await?
            .ok_or_else(|| IntegrationError::NotFound(format!("Salesforce lead {}", lead.email())))?;

        let fields = task_fields(lead, &who_id);
        self.send(|s| self.client.post(self.data_url(s, "sobjects/Task")).json(&fields))
            .await?;

        tracing::info!(lead_id = %lead.id(), "Salesforce follow-up task created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_qualifier_core::{ClassificationResult, EngagementMetrics, LeadStatus, NewLead};

    fn config() -> SalesforceConfig {
        SalesforceConfig {
            username: Some("ops@example.com".to_string()),
            password: Some("hunter2".to_string()),
            security_token: Some("tok".to_string()),
            client_id: Some("cid".to_string()),
            client_secret: Some("secret".to_string()),
            login_url: "https://login.salesforce.com/".to_string(),
            api_version: "v59.0".to_string(),
        }
    }

    fn warm_lead() -> Lead {
        NewLead::new("o'brien@example.com", "Pat O'Brien", EngagementMetrics::new(4, 200, 6, 1, 2))
            .unwrap()
            .with_company(Some("Initech".to_string()))
            .with_source(Some("landing-page".to_string()))
            .finalize(&ClassificationResult {
                status: LeadStatus::Warm,
                score: 63,
                confidence: 0.73,
            })
    }

    #[test]
    fn test_soql_quote() {
        assert_eq!(soql_quote("a@b.com"), "'a@b.com'");
        assert_eq!(soql_quote("o'brien@x.com"), "'o\\'brien@x.com'");
        assert_eq!(soql_quote("back\\slash"), "'back\\\\slash'");
    }

    #[test]
    fn test_lead_fields() {
        let fields = lead_fields(&warm_lead());
        assert_eq!(fields["Email"], "o'brien@example.com");
        assert_eq!(fields["FirstName"], "Pat");
        assert_eq!(fields["LastName"], "O'Brien");
        assert_eq!(fields["Company"], "Initech");
        assert_eq!(fields["LeadSource"], "landing-page");
        assert_eq!(fields["Rating"], "Warm");
        assert_eq!(fields["Lead_Score__c"], 63);
        assert_eq!(fields["Website_Visits__c"], 4);
        assert_eq!(fields["Time_On_Site__c"], 200);
        assert_eq!(fields["Pages_Viewed__c"], 6);
        assert_eq!(fields["Downloaded_Resources__c"], 1);
        assert_eq!(fields["Email_Interactions__c"], 2);
    }

    #[test]
    fn test_task_fields() {
        let task = task_fields(&warm_lead(), "00Q000000000001");
        assert_eq!(task["Subject"], "Follow up with Pat O'Brien (Hot Lead)");
        assert_eq!(task["Priority"], "High");
        assert_eq!(task["Status"], "Not Started");
        assert_eq!(task["WhoId"], "00Q000000000001");
        assert_eq!(task["Type"], "Call");
    }

    #[test]
    fn test_requires_credentials() {
        let mut incomplete = config();
        incomplete.client_secret = None;
        assert!(matches!(
            SalesforceClient::new(&incomplete, Duration::from_secs(5)),
            Err(IntegrationError::NotConfigured(msg)) if msg.contains("client_secret")
        ));

        let client = SalesforceClient::new(&config(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.login_url, "https://login.salesforce.com");
    }

    #[test]
    fn test_data_url() {
        let client = SalesforceClient::new(&config(), Duration::from_secs(5)).unwrap();
        let session = Session {
            access_token: "x".to_string(),
            instance_url: "https://acme.my.salesforce.com/".to_string(),
        };
        assert_eq!(
            client.data_url(&session, "sobjects/Lead"),
            "https://acme.my.salesforce.com/services/data/v59.0/sobjects/Lead"
        );
    }
}
