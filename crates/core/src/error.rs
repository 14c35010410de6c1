//! Error types for lead construction

use thiserror::Error;

/// Errors raised while building a lead from a payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeadError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Lead name is required")]
    MissingName,
}

/// Errors raised by CRM integrations
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Integration not configured: {0}")]
    NotConfigured(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
