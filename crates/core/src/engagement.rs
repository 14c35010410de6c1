//! Engagement metrics attached to every lead

use serde::{Deserialize, Serialize};

/// Behavioral signal counters used as classifier input
///
/// Every counter defaults to zero when it is missing from the payload, so a
/// partially populated mapping still yields a well-formed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementMetrics {
    /// Number of website visits
    pub website_visits: u32,
    /// Total time on site, in seconds
    pub time_on_site: u32,
    /// Number of pages viewed
    pub pages_viewed: u32,
    /// Number of downloaded resources
    pub downloaded_resources: u32,
    /// Number of email interactions (opens, clicks, replies)
    pub email_interactions: u32,
}

impl EngagementMetrics {
    /// Create metrics from the five raw counters, in layout order
    pub fn new(
        website_visits: u32,
        time_on_site: u32,
        pages_viewed: u32,
        downloaded_resources: u32,
        email_interactions: u32,
    ) -> Self {
        Self {
            website_visits,
            time_on_site,
            pages_viewed,
            downloaded_resources,
            email_interactions,
        }
    }

    /// The five raw counters in fixed order
    pub fn raw(&self) -> [u32; 5] {
        [
            self.website_visits,
            self.time_on_site,
            self.pages_viewed,
            self.downloaded_resources,
            self.email_interactions,
        ]
    }

    /// True when every counter is zero
    pub fn is_empty(&self) -> bool {
        self.raw().iter().all(|v| *v == 0)
    }
}
