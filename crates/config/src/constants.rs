//! Centralized constants for the lead qualifier
//!
//! Single source of truth for default values used across the workspace.

/// Service endpoints
pub mod endpoints {
    /// HubSpot REST API
    pub const HUBSPOT_API: &str = "https://api.hubapi.com";

    /// Salesforce OAuth login host (use test.salesforce.com for sandboxes)
    pub const SALESFORCE_LOGIN: &str = "https://login.salesforce.com";

    /// Salesforce REST API version
    pub const SALESFORCE_API_VERSION: &str = "v59.0";
}

/// Model artifact defaults
pub mod model {
    /// Directory holding the classifier, scaler and metadata files
    pub const DEFAULT_DIRECTORY: &str = "models";

    /// Days after training before the model is considered stale
    pub const RETRAIN_AFTER_DAYS: u32 = 7;
}

/// CRM delivery defaults
pub mod delivery {
    /// Bounded queue capacity between the webhook and the CRM worker
    pub const QUEUE_CAPACITY: usize = 256;

    /// Per-request timeout for CRM calls (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}

/// HTTP server defaults
pub mod server {
    pub const PORT: u16 = 8000;

    /// Header carrying the webhook API key
    pub const API_KEY_HEADER: &str = "X-API-Key";

    /// Request timeout (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}
