//! Shared HTTP plumbing for the CRM clients

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use lead_qualifier_core::IntegrationError;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, IntegrationError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| IntegrationError::Internal(format!("HTTP client: {}", e)))
}

pub(crate) fn transport_error(err: reqwest::Error) -> IntegrationError {
    if err.is_timeout() {
        IntegrationError::ConnectionFailed(format!("request timed out: {}", err))
    } else if err.is_decode() {
        IntegrationError::Internal(format!("invalid response body: {}", err))
    } else {
        IntegrationError::ConnectionFailed(err.to_string())
    }
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> IntegrationError {
    let detail = format!("HTTP {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IntegrationError::AuthFailed(detail),
        StatusCode::NOT_FOUND => IntegrationError::NotFound(detail),
        StatusCode::TOO_MANY_REQUESTS => IntegrationError::RateLimited,
        s if s.is_client_error() => IntegrationError::InvalidRequest(detail),
        _ => IntegrationError::ConnectionFailed(detail),
    }
}

/// Pass successful responses through, turn anything else into an error
pub(crate) async fn check(response: Response) -> Result<Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}
