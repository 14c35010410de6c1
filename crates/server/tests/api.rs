//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use lead_qualifier_config::{CrmKind, Settings};
use lead_qualifier_crm::{DeliveryQueue, StubCrm};
use lead_qualifier_scoring::LeadPredictor;
use lead_qualifier_server::{create_router, AppState};

const API_KEY: &str = "test-key";

struct Harness {
    app: Router,
    _dir: TempDir,
}

fn harness_with_key(api_key: Option<&str>) -> Harness {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.server.auth.api_key = api_key.map(str::to_string);
    settings.crm.kind = CrmKind::Stub;

    let predictor = Arc::new(LeadPredictor::load(dir.path()));
    let (delivery, _worker) = DeliveryQueue::spawn(Arc::new(StubCrm::new()), 16);
    let state = AppState::new(settings, predictor, delivery, CrmKind::Stub);

    Harness {
        app: create_router(state),
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with_key(Some(API_KEY))
}

fn post_json(uri: &str, body: Value, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn training_body(n: u32) -> Value {
    let mut leads = Vec::new();
    let mut converted = Vec::new();
    for i in 0..n {
        if i % 2 == 0 {
            leads.push(json!({
                "website_visits": 1, "time_on_site": 10 + i, "pages_viewed": 1,
                "downloaded_resources": 0, "email_interactions": 0
            }));
            converted.push(0);
        } else {
            leads.push(json!({
                "website_visits": 20, "time_on_site": 2400 + i, "pages_viewed": 60,
                "downloaded_resources": 3, "email_interactions": 5
            }));
            converted.push(1);
        }
    }
    json!({ "leads": leads, "converted": converted })
}

#[tokio::test]
async fn health_is_public() {
    let h = harness();
    let (status, body) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["crm_type"], "stub");
    assert_eq!(body["ml_model_loaded"], false);
}

#[tokio::test]
async fn webhook_test_is_public() {
    let h = harness();
    let (status, body) = send(&h.app, get("/webhook/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn webhook_requires_api_key() {
    let h = harness();
    let lead = json!({ "email": "jane@example.com", "name": "Jane Doe" });

    let (status, body) = send(&h.app, post_json("/webhook/leads", lead.clone(), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Invalid API Key");

    let (status, _) = send(&h.app, post_json("/webhook/leads", lead, Some("wrong"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_server_key_rejects_everything_protected() {
    let h = harness_with_key(None);
    let lead = json!({ "email": "jane@example.com", "name": "Jane Doe" });
    let (status, _) = send(&h.app, post_json("/webhook/leads", lead, Some(""))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn webhook_classifies_with_heuristic() {
    let h = harness();
    let lead = json!({
        "email": "jane@example.com",
        "name": "Jane Doe",
        "company": "Acme",
        "visits": 10,
        "time_on_site": 300,
        "pages_viewed": 5,
        "downloads": 2,
        "email_interactions": 3
    });

    let (status, body) = send(&h.app, post_json("/webhook/leads", lead, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["lead"]["status"], "Hot");
    assert_eq!(body["lead"]["score"], 100);
    assert!(body["lead"]["id"].as_str().is_some_and(|id| id.len() == 36));
}

#[tokio::test]
async fn webhook_without_metrics_is_cold() {
    let h = harness();
    let lead = json!({ "email": "bob@example.com", "name": "Bob" });
    let (status, body) = send(&h.app, post_json("/webhook/leads", lead, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lead"]["status"], "Cold");
    assert_eq!(body["lead"]["score"], 0);
}

#[tokio::test]
async fn webhook_rejects_invalid_email() {
    let h = harness();
    let lead = json!({ "email": "not-an-email", "name": "Nobody" });
    let (status, body) = send(&h.app, post_json("/webhook/leads", lead, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn train_rejects_insufficient_data() {
    let h = harness();
    let (status, body) = send(&h.app, post_json("/train-model", training_body(9), Some(API_KEY))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("at least 10"));

    let (_, status_body) = send(&h.app, get("/model/status")).await;
    assert_eq!(status_body["model_loaded"], false);
    assert_eq!(status_body["needs_retraining"], true);
    assert_eq!(status_body["metadata"]["performance_metrics"]["accuracy"], 0.0);
}

#[tokio::test]
async fn train_rejects_bad_labels() {
    let h = harness();
    let mut body = training_body(12);
    body["converted"][4] = json!(3);
    let (status, _) = send(&h.app, post_json("/train-model", body, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn train_then_status_reports_model() {
    let h = harness();
    let (status, body) = send(&h.app, post_json("/train-model", training_body(20), Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Model trained successfully");
    assert_eq!(body["num_samples"], 20);
    assert_eq!(body["performance_metrics"]["accuracy"], 1.0);

    let (status, body) = send(&h.app, get("/model/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["needs_retraining"], false);
    assert_eq!(body["metadata"]["version"], "1.0.0");
    assert_eq!(body["metadata"]["num_samples"], 20);

    let (_, health) = send(&h.app, get("/health")).await;
    assert_eq!(health["ml_model_loaded"], true);
}

#[tokio::test]
async fn train_requires_api_key() {
    let h = harness();
    let (status, _) = send(&h.app, post_json("/train-model", training_body(20), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn conversion_report_by_tier() {
    let h = harness();
    let body = json!({
        "outcomes": [
            { "status": "Hot", "converted": true },
            { "status": "Hot", "converted": false },
            { "status": "Warm", "converted": true },
            { "status": "Cold", "converted": false }
        ]
    });
    let (status, report) = send(&h.app, post_json("/reports/conversion", body, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_leads"], 4);
    assert_eq!(report["tiers"][0]["status"], "Hot");
    assert_eq!(report["tiers"][0]["conversion_rate"], 0.5);
    assert!(report["summary"]
        .as_str()
        .unwrap()
        .contains("Warm Lead Conversion Rate: 100.00%"));
}

#[tokio::test]
async fn metrics_unavailable_without_recorder() {
    let h = harness();
    let response = h.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
