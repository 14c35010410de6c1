//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{delivery, endpoints, model, server};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact location
    #[serde(default)]
    pub model: ModelConfig,

    /// CRM backend and delivery queue
    #[serde(default)]
    pub crm: CrmConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_crm()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.auth.api_key.as_deref().map_or(true, str::is_empty) {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField("server.auth.api_key".to_string()));
            }
            tracing::warn!("No webhook API key configured; protected routes will reject all requests");
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty() {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_crm(&self) -> Result<(), ConfigError> {
        let crm = &self.crm;

        if crm.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crm.queue_capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if let Ok(raw) = std::env::var("CRM_TYPE") {
            if !raw.trim().is_empty() && CrmKind::parse(&raw).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "CRM_TYPE".to_string(),
                    message: format!("Unsupported CRM type: {}", raw),
                });
            }
        }

        match crm.kind {
            CrmKind::HubSpot => {
                if crm.hubspot.access_token.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::MissingField("crm.hubspot.access_token".to_string()));
                }
            },
            CrmKind::Salesforce => {
                let sf = &crm.salesforce;
                let required = [
                    ("crm.salesforce.username", &sf.username),
                    ("crm.salesforce.password", &sf.password),
                    ("crm.salesforce.client_id", &sf.client_id),
                    ("crm.salesforce.client_secret", &sf.client_secret),
                ];
                for (field, value) in required {
                    if value.as_deref().map_or(true, str::is_empty) {
                        return Err(ConfigError::MissingField(field.to_string()));
                    }
                }
            },
            CrmKind::Stub => {
                if self.environment.is_production() {
                    tracing::warn!("Stub CRM selected in production; leads will not leave this service");
                }
            },
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Webhook authentication
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    server::PORT
}
fn default_timeout() -> u64 {
    server::REQUEST_TIMEOUT_SECS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// API key authentication for the webhook and admin routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared key expected in the `X-API-Key` header
    /// (LEAD_QUALIFIER__SERVER__AUTH__API_KEY, falls back to WEBHOOK_API_KEY)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_api_key() -> Option<String> {
    env_non_empty("WEBHOOK_API_KEY")
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/webhook/test".to_string(),
        "/model/status".to_string(),
        "/metrics".to_string(),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            public_paths: default_public_paths(),
        }
    }
}

impl AuthConfig {
    /// Check whether a path is reachable without a key
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding lead_predictor.json, scaler.json and metadata.json
    #[serde(default = "default_model_directory")]
    pub directory: String,

    /// Age after which a trained model is reported as stale
    #[serde(default = "default_retrain_after_days")]
    pub retrain_after_days: u32,
}

fn default_retrain_after_days() -> u32 {
    model::RETRAIN_AFTER_DAYS
}

fn default_model_directory() -> String {
    env_non_empty("MODEL_DIR").unwrap_or_else(|| model::DEFAULT_DIRECTORY.to_string())
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            directory: default_model_directory(),
            retrain_after_days: default_retrain_after_days(),
        }
    }
}

/// Supported CRM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrmKind {
    #[serde(alias = "hub_spot")]
    HubSpot,
    Salesforce,
    /// Logs deliveries without calling out (development)
    #[default]
    Stub,
}

impl CrmKind {
    /// Parse a CRM type name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hubspot" | "hub_spot" => Some(CrmKind::HubSpot),
            "salesforce" => Some(CrmKind::Salesforce),
            "stub" | "none" => Some(CrmKind::Stub),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrmKind::HubSpot => "hubspot",
            CrmKind::Salesforce => "salesforce",
            CrmKind::Stub => "stub",
        }
    }
}

/// CRM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// Which backend receives leads (falls back to CRM_TYPE)
    #[serde(default = "default_crm_kind")]
    pub kind: CrmKind,

    /// Capacity of the in-memory delivery queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-request timeout for CRM calls
    #[serde(default = "default_crm_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub hubspot: HubSpotConfig,

    #[serde(default)]
    pub salesforce: SalesforceConfig,
}

fn default_crm_kind() -> CrmKind {
    std::env::var("CRM_TYPE")
        .ok()
        .and_then(|v| CrmKind::parse(&v))
        .unwrap_or_default()
}

fn default_queue_capacity() -> usize {
    delivery::QUEUE_CAPACITY
}

fn default_crm_timeout() -> u64 {
    delivery::REQUEST_TIMEOUT_SECS
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            kind: default_crm_kind(),
            queue_capacity: default_queue_capacity(),
            timeout_seconds: default_crm_timeout(),
            hubspot: HubSpotConfig::default(),
            salesforce: SalesforceConfig::default(),
        }
    }
}

/// HubSpot private-app credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotConfig {
    /// Access token (falls back to HUBSPOT_API_KEY)
    #[serde(default = "default_hubspot_token")]
    pub access_token: Option<String>,

    #[serde(default = "default_hubspot_base_url")]
    pub base_url: String,
}

fn default_hubspot_token() -> Option<String> {
    env_non_empty("HUBSPOT_API_KEY")
}

fn default_hubspot_base_url() -> String {
    endpoints::HUBSPOT_API.to_string()
}

impl Default for HubSpotConfig {
    fn default() -> Self {
        Self {
            access_token: default_hubspot_token(),
            base_url: default_hubspot_base_url(),
        }
    }
}

/// Salesforce connected-app credentials for the username-password flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesforceConfig {
    #[serde(default = "default_sf_username")]
    pub username: Option<String>,

    #[serde(default = "default_sf_password")]
    pub password: Option<String>,

    /// Appended to the password at login
    #[serde(default = "default_sf_token")]
    pub security_token: Option<String>,

    #[serde(default = "default_sf_client_id")]
    pub client_id: Option<String>,

    #[serde(default = "default_sf_client_secret")]
    pub client_secret: Option<String>,

    #[serde(default = "default_sf_login_url")]
    pub login_url: String,

    #[serde(default = "default_sf_api_version")]
    pub api_version: String,
}

fn default_sf_username() -> Option<String> {
    env_non_empty("SALESFORCE_USERNAME")
}
fn default_sf_password() -> Option<String> {
    env_non_empty("SALESFORCE_PASSWORD")
}
fn default_sf_token() -> Option<String> {
    env_non_empty("SALESFORCE_TOKEN")
}
fn default_sf_client_id() -> Option<String> {
    env_non_empty("SALESFORCE_CLIENT_ID")
}
fn default_sf_client_secret() -> Option<String> {
    env_non_empty("SALESFORCE_CLIENT_SECRET")
}
fn default_sf_login_url() -> String {
    endpoints::SALESFORCE_LOGIN.to_string()
}
fn default_sf_api_version() -> String {
    endpoints::SALESFORCE_API_VERSION.to_string()
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            username: default_sf_username(),
            password: default_sf_password(),
            security_token: default_sf_token(),
            client_id: default_sf_client_id(),
            client_secret: default_sf_client_secret(),
            login_url: default_sf_login_url(),
            api_version: default_sf_api_version(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (falls back to LOG_LEVEL)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    env_non_empty("LOG_LEVEL")
        .map(|l| l.to_lowercase())
        .unwrap_or_else(|| "info".to_string())
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.* > config/default.* > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("LEAD_QUALIFIER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
