//! Configuration management for the lead qualifier
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files (config/default.*, config/{env}.*)
//! - Environment variables (LEAD_QUALIFIER_ prefix, `__` separator)
//! - Legacy deployment variables (WEBHOOK_API_KEY, CRM_TYPE, HUBSPOT_API_KEY,
//!   SALESFORCE_*, LOG_LEVEL, MODEL_DIR) as field defaults

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, AuthConfig, CrmConfig, CrmKind, HubSpotConfig, ModelConfig,
    ObservabilityConfig, RuntimeEnvironment, SalesforceConfig, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
