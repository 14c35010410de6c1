//! Prometheus metrics

use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use lead_qualifier_core::{EstimateSource, LeadStatus};

use crate::state::AppState;

/// Install the global Prometheus recorder
///
/// Returns `None` if a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

pub fn record_lead_received() {
    metrics::counter!("lead_qualifier_leads_received_total").increment(1);
}

pub fn record_classification(status: LeadStatus, source: EstimateSource, elapsed: Duration) {
    metrics::counter!(
        "lead_qualifier_leads_classified_total",
        "status" => status.as_str(),
        "source" => source.as_str()
    )
    .increment(1);
    metrics::histogram!("lead_qualifier_classification_seconds").record(elapsed.as_secs_f64());
}

pub fn record_training(outcome: &'static str) {
    metrics::counter!("lead_qualifier_training_runs_total", "outcome" => outcome).increment(1);
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics recorder not installed").into_response(),
    }
}
