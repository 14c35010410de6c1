//! HTTP Endpoints
//!
//! REST API for lead intake, model training and reporting.

use std::time::{Duration, Instant};

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lead_qualifier_core::{EngagementMetrics, LeadIntake, LeadStatus, NewLead};
use lead_qualifier_crm::EnqueueOutcome;
use lead_qualifier_scoring::{labels_from_ints, ConversionReport, LeadOutcome};

use crate::auth::auth_middleware;
use crate::metrics::{metrics_handler, record_classification, record_lead_received, record_training};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds.max(1));

    Router::new()
        // Lead intake
        .route("/webhook/leads", post(receive_lead))
        .route("/webhook/test", get(webhook_test))
        // Model
        .route("/train-model", post(train_model))
        .route("/model/status", get(model_status))
        // Reporting
        .route("/reports/conversion", post(conversion_report))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no configured origin parses, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to localhost:3000");
        return layer.allow_origin(HeaderValue::from_static("http://localhost:3000"));
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    layer.allow_origin(parsed_origins)
}

#[derive(Debug, Serialize)]
struct LeadSummary {
    id: String,
    status: LeadStatus,
    score: u8,
}

#[derive(Debug, Serialize)]
struct LeadResponse {
    success: bool,
    lead: LeadSummary,
}

/// Classify an incoming lead and queue it for CRM delivery
async fn receive_lead(
    State(state): State<AppState>,
    Json(intake): Json<LeadIntake>,
) -> Result<Json<LeadResponse>, ServerError> {
    record_lead_received();
    let new_lead = NewLead::from_intake(intake)?;

    let started = Instant::now();
    let (lead, detailed) = state.classifier.classify_lead(new_lead);
    record_classification(lead.status(), detailed.source, started.elapsed());

    tracing::info!(
        lead_id = %lead.id(),
        status = %lead.status(),
        score = lead.score(),
        confidence = detailed.result.confidence,
        source = detailed.source.as_str(),
        "Lead classified"
    );

    let response = LeadResponse {
        success: true,
        lead: LeadSummary {
            id: lead.id().to_string(),
            status: lead.status(),
            score: lead.score(),
        },
    };

    if state.delivery.enqueue(lead) == EnqueueOutcome::Dropped {
        tracing::warn!(lead_id = %response.lead.id, "Lead not queued for CRM delivery");
    }

    Ok(Json(response))
}

async fn webhook_test() -> Json<Value> {
    Json(json!({
        "status": "active",
        "message": "Webhook endpoint is ready to receive leads"
    }))
}

#[derive(Debug, Deserialize)]
struct TrainRequest {
    leads: Vec<EngagementMetrics>,
    /// 1 for converted, 0 for not converted
    converted: Vec<i64>,
}

/// Retrain the model from labelled engagement metrics
async fn train_model(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> Result<Json<Value>, ServerError> {
    let labels = labels_from_ints(&request.converted).map_err(|e| {
        record_training("rejected");
        ServerError::from(e)
    })?;

    let predictor = state.predictor.clone();
    let samples = request.leads;
    let result = tokio::task::spawn_blocking(move || predictor.train(&samples, &labels))
        .await
        .map_err(|e| {
            record_training("failed");
            ServerError::Internal(format!("Training task failed: {}", e))
        })?;

    match result {
        Ok(summary) => {
            record_training("success");
            Ok(Json(json!({
                "message": "Model trained successfully",
                "training_date": summary.training_date,
                "num_samples": summary.num_samples,
                "performance_metrics": summary.performance_metrics,
            })))
        }
        Err(e) => {
            let outcome = if e.is_client_error() { "rejected" } else { "failed" };
            record_training(outcome);
            tracing::warn!(error = %e, "Model training failed");
            Err(e.into())
        }
    }
}

async fn model_status(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.predictor.snapshot();
    Json(json!({
        "model_loaded": snapshot.is_trained(),
        "needs_retraining": state.predictor.needs_retraining(),
        "metadata": snapshot.metadata(),
    }))
}

#[derive(Debug, Deserialize)]
struct ConversionReportRequest {
    outcomes: Vec<LeadOutcome>,
}

async fn conversion_report(Json(request): Json<ConversionReportRequest>) -> Json<Value> {
    let report: ConversionReport = request.outcomes.into_iter().collect();
    Json(json!({
        "total_leads": report.total_leads,
        "tiers": report.tiers,
        "summary": report.summary(),
    }))
}

/// Health check
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "crm_type": state.crm_kind.as_str(),
            "ml_model_loaded": state.predictor.is_trained(),
        })),
    )
}
