//! Trainable lead predictor
//!
//! Holds the current forest and scaler behind a shared snapshot. Until a
//! model is trained (or loaded from disk) every prediction goes through the
//! heuristic scorer.
//!
//! Training is serialized by a writer mutex that covers fit, persist and
//! swap. Readers clone the snapshot `Arc` under a short read lock, so a
//! prediction always pairs a forest with the scaler it was fitted with.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ndarray::Array2;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use lead_qualifier_core::{ConversionEstimator, EngagementMetrics, EstimateSource};

use crate::artifacts::{load_metadata, ArtifactPaths, ModelArtifacts, ModelMetadata, MODEL_VERSION};
use crate::evaluation::PerformanceMetrics;
use crate::features::{derive_features, FEATURE_COUNT};
use crate::forest::{ForestParams, RandomForest};
use crate::heuristic::heuristic_score;
use crate::scaler::StandardScaler;
use crate::ScoringError;

/// Minimum number of labelled samples accepted by [`LeadPredictor::train`]
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Default model age after which retraining is suggested
pub const DEFAULT_RETRAIN_AFTER_DAYS: u32 = 7;

/// Result of a successful training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub training_date: DateTime<Utc>,
    pub num_samples: usize,
    pub performance_metrics: PerformanceMetrics,
}

/// Immutable view of the model at a point in time
#[derive(Debug, Clone, Default)]
pub struct ModelSnapshot {
    artifacts: Option<ModelArtifacts>,
    metadata: ModelMetadata,
}

impl ModelSnapshot {
    pub fn is_trained(&self) -> bool {
        self.artifacts.is_some()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Conversion probability and the path that produced it
    pub fn estimate(&self, metrics: &EngagementMetrics) -> (f64, EstimateSource) {
        match &self.artifacts {
            Some(model) => {
                let scaled = model.scaler.transform_row(&derive_features(metrics));
                (model.forest.predict_proba(&scaled), EstimateSource::Model)
            }
            None => (heuristic_score(metrics), EstimateSource::Heuristic),
        }
    }
}

pub struct LeadPredictor {
    paths: ArtifactPaths,
    params: ForestParams,
    retrain_after: Duration,
    snapshot: RwLock<Arc<ModelSnapshot>>,
    train_lock: Mutex<()>,
}

impl LeadPredictor {
    /// Load whatever model exists in `directory`
    ///
    /// Never fails: missing or unreadable artifacts leave the predictor
    /// untrained and are logged.
    pub fn load(directory: impl Into<PathBuf>) -> Self {
        let paths = ArtifactPaths::new(directory);
        let metadata = load_metadata(&paths);

        let artifacts = if paths.model_exists() {
            match ModelArtifacts::load(&paths) {
                Ok(artifacts) => {
                    tracing::info!(
                        directory = %paths.directory.display(),
                        version = %metadata.version,
                        num_samples = metadata.num_samples,
                        "Loaded trained lead model"
                    );
                    Some(artifacts)
                }
                Err(e) => {
                    tracing::warn!(
                        directory = %paths.directory.display(),
                        error = %e,
                        "Failed to load lead model, using heuristic scoring"
                    );
                    None
                }
            }
        } else {
            tracing::info!(
                directory = %paths.directory.display(),
                "No trained model found, using heuristic scoring"
            );
            None
        };

        Self {
            paths,
            params: ForestParams::default(),
            retrain_after: Duration::days(i64::from(DEFAULT_RETRAIN_AFTER_DAYS)),
            snapshot: RwLock::new(Arc::new(ModelSnapshot { artifacts, metadata })),
            train_lock: Mutex::new(()),
        }
    }

    /// Override forest hyperparameters for future training runs
    pub fn with_params(mut self, params: ForestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_retrain_after_days(mut self, days: u32) -> Self {
        self.retrain_after = Duration::days(i64::from(days));
        self
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Current model snapshot
    pub fn snapshot(&self) -> Arc<ModelSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.snapshot().is_trained()
    }

    pub fn metadata(&self) -> ModelMetadata {
        self.snapshot().metadata.clone()
    }

    /// Conversion probability in `[0, 1]`
    pub fn predict(&self, metrics: &EngagementMetrics) -> f64 {
        self.snapshot().estimate(metrics).0
    }

    /// Fit a new model, persist it and make it current
    ///
    /// The previous model stays in effect if validation or persistence fails.
    pub fn train(
        &self,
        samples: &[EngagementMetrics],
        labels: &[u8],
    ) -> Result<TrainingSummary, ScoringError> {
        if samples.len() < MIN_TRAINING_SAMPLES {
            return Err(ScoringError::InsufficientData {
                required: MIN_TRAINING_SAMPLES,
                actual: samples.len(),
            });
        }
        if labels.len() != samples.len() {
            return Err(ScoringError::LabelMismatch {
                samples: samples.len(),
                labels: labels.len(),
            });
        }
        if let Some((index, &value)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
            return Err(ScoringError::InvalidLabel {
                index,
                value: i64::from(value),
            });
        }

        let _guard = self.train_lock.lock();

        let features: Vec<_> = samples.iter().map(derive_features).collect();
        let x = Array2::from_shape_fn((features.len(), FEATURE_COUNT), |(i, j)| features[i][j]);

        let scaler = StandardScaler::fit(x.view());
        let scaled = scaler.transform(x.view());
        let forest = RandomForest::fit(scaled.view(), labels, self.params);

        let predicted: Vec<u8> = forest
            .predict_proba_batch(scaled.view())
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect();
        let performance = PerformanceMetrics::evaluate(labels, &predicted);

        let training_date = Utc::now();
        let metadata = ModelMetadata {
            version: MODEL_VERSION.to_string(),
            training_date: Some(training_date),
            num_samples: samples.len(),
            performance_metrics: performance,
        };

        let artifacts = ModelArtifacts { forest, scaler };
        artifacts.save(&self.paths, &metadata)?;

        *self.snapshot.write() = Arc::new(ModelSnapshot {
            artifacts: Some(artifacts),
            metadata,
        });

        tracing::info!(
            num_samples = samples.len(),
            accuracy = performance.accuracy,
            precision = performance.precision,
            recall = performance.recall,
            "Lead model trained"
        );

        Ok(TrainingSummary {
            training_date,
            num_samples: samples.len(),
            performance_metrics: performance,
        })
    }

    /// True if no model is loaded or the last training is older than the
    /// retrain window
    pub fn needs_retraining(&self) -> bool {
        self.needs_retraining_at(Utc::now())
    }

    /// Also true when artifacts exist on disk but failed to load, whatever
    /// the metadata says
    pub fn needs_retraining_at(&self, now: DateTime<Utc>) -> bool {
        let snapshot = self.snapshot();
        match snapshot.metadata.training_date {
            Some(trained) if snapshot.is_trained() => now - trained > self.retrain_after,
            _ => true,
        }
    }
}

impl ConversionEstimator for LeadPredictor {
    fn estimate(&self, metrics: &EngagementMetrics) -> (f64, EstimateSource) {
        self.snapshot().estimate(metrics)
    }
}

/// Convert raw integer labels, rejecting anything other than 0 and 1
pub fn labels_from_ints(raw: &[i64]) -> Result<Vec<u8>, ScoringError> {
    raw.iter()
        .enumerate()
        .map(|(index, &value)| match value {
            0 => Ok(0),
            1 => Ok(1),
            _ => Err(ScoringError::InvalidLabel { index, value }),
        })
        .collect()
}
