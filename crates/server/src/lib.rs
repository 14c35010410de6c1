//! Lead Qualifier Server
//!
//! HTTP endpoints for lead intake, model training and reporting.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod state;

pub use auth::auth_middleware;
pub use http::create_router;
pub use metrics::{init_metrics, record_classification, record_lead_received, record_training};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use lead_qualifier_core::LeadError;
use lead_qualifier_scoring::ScoringError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid API Key")]
    Auth,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Auth => StatusCode::FORBIDDEN,
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        let status = StatusCode::from(self);
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

impl From<LeadError> for ServerError {
    fn from(err: LeadError) -> Self {
        ServerError::Validation(err.to_string())
    }
}

impl From<ScoringError> for ServerError {
    fn from(err: ScoringError) -> Self {
        if err.is_client_error() {
            ServerError::InvalidRequest(err.to_string())
        } else {
            ServerError::Internal(format!("Failed to train model: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(StatusCode::from(ServerError::Auth), StatusCode::FORBIDDEN);
        assert_eq!(
            StatusCode::from(ServerError::from(LeadError::MissingName)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            StatusCode::from(ServerError::from(ScoringError::InsufficientData {
                required: 10,
                actual: 3
            })),
            StatusCode::BAD_REQUEST
        );
    }
}
