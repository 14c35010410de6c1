//! Lead entity and webhook intake payload
//!
//! A lead is created unclassified ([`NewLead`], status Cold and score 0) and
//! becomes a [`Lead`] exactly once through [`NewLead::finalize`]. Downstream
//! consumers (the response envelope, CRM delivery) only ever receive the
//! finalized form, so score and status are always consistent with the
//! classification that produced them.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classification::{ClassificationResult, LeadStatus};
use crate::engagement::EngagementMetrics;
use crate::error::LeadError;

/// Source label used when the payload does not name one
pub const DEFAULT_SOURCE: &str = "webhook";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// Check that a string looks like a deliverable email address
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_PATTERN.is_match(email)
}

/// Raw lead payload as delivered by the webhook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadIntake {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub visits: Option<u32>,
    #[serde(default)]
    pub time_on_site: Option<u32>,
    #[serde(default)]
    pub pages_viewed: Option<u32>,
    #[serde(default)]
    pub downloads: Option<u32>,
    #[serde(default)]
    pub email_interactions: Option<u32>,
}

impl LeadIntake {
    /// Engagement counters, with absent values treated as zero
    pub fn engagement_metrics(&self) -> EngagementMetrics {
        EngagementMetrics {
            website_visits: self.visits.unwrap_or(0),
            time_on_site: self.time_on_site.unwrap_or(0),
            pages_viewed: self.pages_viewed.unwrap_or(0),
            downloaded_resources: self.downloads.unwrap_or(0),
            email_interactions: self.email_interactions.unwrap_or(0),
        }
    }
}

/// A classified lead, ready for the response envelope and CRM delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    id: Uuid,
    email: String,
    name: String,
    company: Option<String>,
    source: String,
    engagement_metrics: EngagementMetrics,
    created_at: DateTime<Utc>,
    status: LeadStatus,
    score: u8,
}

impl Lead {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn engagement_metrics(&self) -> &EngagementMetrics {
        &self.engagement_metrics
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> LeadStatus {
        self.status
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    /// First name: the first whitespace-separated token of the name
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Last name: the last token when the name has more than one, else empty
    pub fn last_name(&self) -> &str {
        let mut tokens = self.name.split_whitespace();
        let first = tokens.next();
        match (first, tokens.last()) {
            (Some(_), Some(last)) => last,
            _ => "",
        }
    }
}

/// A lead that has not been classified yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    inner: Lead,
}

impl NewLead {
    /// Create a lead with a fresh id and creation timestamp
    ///
    /// Fails when the email is not a valid address or the name is blank.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        engagement_metrics: EngagementMetrics,
    ) -> Result<Self, LeadError> {
        let email = email.into().trim().to_string();
        if !is_valid_email(&email) {
            return Err(LeadError::InvalidEmail(email));
        }

        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(LeadError::MissingName);
        }

        Ok(Self {
            inner: Lead {
                id: Uuid::new_v4(),
                email,
                name,
                company: None,
                source: DEFAULT_SOURCE.to_string(),
                engagement_metrics,
                created_at: Utc::now(),
                status: LeadStatus::Cold,
                score: 0,
            },
        })
    }

    /// Build from a webhook payload
    pub fn from_intake(intake: LeadIntake) -> Result<Self, LeadError> {
        let metrics = intake.engagement_metrics();
        let lead = Self::new(intake.email, intake.name, metrics)?;
        Ok(lead.with_company(intake.company).with_source(intake.source))
    }

    pub fn with_company(mut self, company: Option<String>) -> Self {
        self.inner.company = company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }

    /// Set the source label; absent or blank keeps [`DEFAULT_SOURCE`]
    pub fn with_source(mut self, source: Option<String>) -> Self {
        if let Some(source) = source.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            self.inner.source = source;
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn engagement_metrics(&self) -> &EngagementMetrics {
        &self.inner.engagement_metrics
    }

    /// Read-only view; status and score are still Cold/0 here
    pub fn as_lead(&self) -> &Lead {
        &self.inner
    }

    /// Fold the classification into the lead
    pub fn finalize(self, classification: &ClassificationResult) -> Lead {
        let mut lead = self.inner;
        lead.status = classification.status;
        lead.score = classification.score.min(100);
        lead
    }
}
