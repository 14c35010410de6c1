//! API key authentication
//!
//! Protected routes require the configured webhook key in the `X-API-Key`
//! header. Public paths bypass the check. With no key configured every
//! protected request is rejected.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use lead_qualifier_config::constants::server::API_KEY_HEADER;

use crate::state::AppState;
use crate::ServerError;

pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.config.server.auth;
    let path = request.uri().path();

    if auth.is_public(path) {
        return next.run(request).await;
    }

    let Some(expected) = auth.api_key.as_deref().filter(|k| !k.is_empty()) else {
        tracing::error!(path = %path, "No webhook API key configured, rejecting request");
        return ServerError::Auth.into_response();
    };

    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|provided| constant_time_compare(provided.as_bytes(), expected.as_bytes()));

    if !authorized {
        tracing::warn!(
            path = %path,
            forwarded_for = ?request.headers().get("X-Forwarded-For"),
            "Invalid API key"
        );
        return ServerError::Auth.into_response();
    }

    next.run(request).await
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"secret", b"secret"));
        assert!(!constant_time_compare(b"secret", b"secre"));
        assert!(!constant_time_compare(b"secret", b"secreT"));
        assert!(!constant_time_compare(b"", b"x"));
    }
}
