//! Lead classifier
//!
//! Combines a [`ConversionEstimator`] with the classification policy.

use std::sync::Arc;

use serde::Serialize;

use lead_qualifier_core::{
    ClassificationResult, ConversionEstimator, EngagementMetrics, EstimateSource, Lead, NewLead,
};

use crate::policy::classify_probability;

/// Classification outcome together with the raw probability behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetailedClassification {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub probability: f64,
    pub source: EstimateSource,
}

#[derive(Clone)]
pub struct LeadClassifier {
    estimator: Arc<dyn ConversionEstimator>,
}

impl LeadClassifier {
    pub fn new(estimator: Arc<dyn ConversionEstimator>) -> Self {
        Self { estimator }
    }

    /// Classify engagement metrics; never fails
    pub fn classify(&self, metrics: &EngagementMetrics) -> ClassificationResult {
        self.classify_detailed(metrics).result
    }

    pub fn classify_detailed(&self, metrics: &EngagementMetrics) -> DetailedClassification {
        let (probability, source) = self.estimator.estimate(metrics);
        let result = classify_probability(probability);

        tracing::debug!(
            probability,
            source = source.as_str(),
            score = result.score,
            status = %result.status,
            "Lead classified"
        );

        DetailedClassification {
            result,
            probability,
            source,
        }
    }

    /// Score a new lead and fold the outcome into it
    pub fn classify_lead(&self, lead: NewLead) -> (Lead, DetailedClassification) {
        let detailed = self.classify_detailed(lead.engagement_metrics());
        (lead.finalize(&detailed.result), detailed)
    }
}
