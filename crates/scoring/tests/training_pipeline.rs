//! End-to-end training and classification against a temporary model directory

use std::sync::Arc;

use chrono::Duration;
use lead_qualifier_core::{EngagementMetrics, EstimateSource, LeadStatus, NewLead};
use lead_qualifier_scoring::{
    heuristic_score, ForestParams, LeadClassifier, LeadPredictor, ModelMetadata, ScoringError,
};
use tempfile::TempDir;

fn training_set() -> (Vec<EngagementMetrics>, Vec<u8>) {
    let mut samples = Vec::new();
    let mut labels = Vec::new();
    for i in 0..20u32 {
        samples.push(EngagementMetrics::new(1 + i % 2, 10 + i, 1, 0, i % 2));
        labels.push(0);
    }
    for i in 0..20u32 {
        samples.push(EngagementMetrics::new(
            20 + i % 3,
            2400 + 10 * i,
            66 + i % 4,
            3 + i % 2,
            5 + i % 3,
        ));
        labels.push(1);
    }
    (samples, labels)
}

#[test]
fn cold_start_classifies_with_heuristic() {
    let dir = TempDir::new().unwrap();
    let predictor = Arc::new(LeadPredictor::load(dir.path().join("models")));
    let classifier = LeadClassifier::new(predictor.clone());

    let metrics = EngagementMetrics::new(10, 300, 5, 2, 3);
    let detailed = classifier.classify_detailed(&metrics);
    assert_eq!(detailed.source, EstimateSource::Heuristic);
    assert_eq!(detailed.result.score, 100);
    assert_eq!(detailed.result.status, LeadStatus::Hot);
    assert!((detailed.result.confidence - 0.8).abs() < 1e-12);

    let cold = classifier.classify(&EngagementMetrics::default());
    assert_eq!(cold.score, 0);
    assert_eq!(cold.status, LeadStatus::Cold);

    assert!(predictor.needs_retraining());
    assert_eq!(predictor.metadata(), ModelMetadata::default());
}

#[test]
fn nine_samples_leave_prior_model_untouched() {
    let dir = TempDir::new().unwrap();
    let predictor = LeadPredictor::load(dir.path());
    let (samples, labels) = training_set();

    predictor.train(&samples, &labels).unwrap();
    let before = predictor.metadata();
    let probe = EngagementMetrics::new(2, 15, 1, 0, 1);
    let before_p = predictor.predict(&probe);

    let err = predictor.train(&samples[..9], &labels[..9]).unwrap_err();
    assert!(matches!(err, ScoringError::InsufficientData { actual: 9, .. }));
    assert!(err.is_client_error());
    assert_eq!(predictor.metadata(), before);
    assert_eq!(predictor.predict(&probe), before_p);
}

#[test]
fn training_persists_artifacts_and_switches_to_model() {
    let dir = TempDir::new().unwrap();
    let predictor = Arc::new(LeadPredictor::load(dir.path()));
    let classifier = LeadClassifier::new(predictor.clone());
    let (samples, labels) = training_set();

    let summary = predictor.train(&samples, &labels).unwrap();
    assert_eq!(summary.num_samples, 40);
    assert_eq!(summary.performance_metrics.accuracy, 1.0);
    assert_eq!(summary.performance_metrics.precision, 1.0);
    assert_eq!(summary.performance_metrics.recall, 1.0);

    for file in ["lead_predictor.json", "scaler.json", "metadata.json"] {
        assert!(dir.path().join(file).exists(), "{} missing", file);
    }

    let metadata: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["version"], "1.0.0");
    assert_eq!(metadata["num_samples"], 40);
    assert!(metadata["training_date"].is_string());

    let hot = classifier.classify_detailed(&samples[25]);
    assert_eq!(hot.source, EstimateSource::Model);
    assert_eq!(hot.result.status, LeadStatus::Hot);
    assert_eq!(hot.result.score, 100);

    let cold = classifier.classify(&samples[3]);
    assert_eq!(cold.status, LeadStatus::Cold);
    assert_eq!(cold.score, 0);

    assert!(!predictor.needs_retraining());
    assert!(predictor.needs_retraining_at(summary.training_date + Duration::days(8)));
}

#[test]
fn same_seed_gives_same_model() {
    let (samples, labels) = training_set();
    let a_dir = TempDir::new().unwrap();
    let b_dir = TempDir::new().unwrap();

    let a = LeadPredictor::load(a_dir.path());
    let b = LeadPredictor::load(b_dir.path());
    a.train(&samples, &labels).unwrap();
    b.train(&samples, &labels).unwrap();

    let a_forest = std::fs::read(a_dir.path().join("lead_predictor.json")).unwrap();
    let b_forest = std::fs::read(b_dir.path().join("lead_predictor.json")).unwrap();
    assert_eq!(a_forest, b_forest);

    let probes = [
        EngagementMetrics::new(5, 150, 3, 1, 2),
        EngagementMetrics::new(12, 900, 30, 2, 4),
        EngagementMetrics::new(0, 0, 5, 0, 0),
    ];
    for probe in &probes {
        assert_eq!(a.predict(probe), b.predict(probe));
    }
}

#[test]
fn reloaded_model_matches_trained_model() {
    let dir = TempDir::new().unwrap();
    let (samples, labels) = training_set();
    let trained = LeadPredictor::load(dir.path()).with_params(ForestParams {
        n_trees: 25,
        ..Default::default()
    });
    trained.train(&samples, &labels).unwrap();

    let reloaded = LeadPredictor::load(dir.path());
    assert!(reloaded.is_trained());
    for metrics in &samples {
        assert_eq!(reloaded.predict(metrics), trained.predict(metrics));
    }
}

#[test]
fn classify_lead_carries_result_onto_lead() {
    let dir = TempDir::new().unwrap();
    let classifier = LeadClassifier::new(Arc::new(LeadPredictor::load(dir.path())));

    let metrics = EngagementMetrics::new(5, 150, 0, 1, 0);
    let lead = NewLead::new("ada@example.com", "Ada Lovelace", metrics).unwrap();
    let (lead, detailed) = classifier.classify_lead(lead);

    assert_eq!(detailed.probability, heuristic_score(&metrics));
    assert_eq!(lead.score(), detailed.result.score);
    assert_eq!(lead.status(), detailed.result.status);
    assert_eq!(lead.first_name(), "Ada");
    assert_eq!(lead.last_name(), "Lovelace");
}
