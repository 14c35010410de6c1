//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use lead_qualifier_config::{CrmKind, Settings};
use lead_qualifier_crm::DeliveryQueue;
use lead_qualifier_scoring::{LeadClassifier, LeadPredictor};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// Trainable model; also the classifier's estimator
    pub predictor: Arc<LeadPredictor>,
    pub classifier: LeadClassifier,
    /// Hands classified leads to the CRM worker
    pub delivery: DeliveryQueue,
    pub crm_kind: CrmKind,
    /// Prometheus handle, `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Settings,
        predictor: Arc<LeadPredictor>,
        delivery: DeliveryQueue,
        crm_kind: CrmKind,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier: LeadClassifier::new(predictor.clone()),
            predictor,
            delivery,
            crm_kind,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}
