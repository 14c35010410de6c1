//! Model artifact persistence
//!
//! Three JSON files live in the model directory:
//! - `lead_predictor.json`: fitted forest
//! - `scaler.json`: fitted standard scaler
//! - `metadata.json`: version, training date, sample count, metrics
//!
//! Every write goes to a temporary file in the same directory which is then
//! renamed over the target, so readers never observe a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::evaluation::PerformanceMetrics;
use crate::features::FEATURE_COUNT;
use crate::forest::RandomForest;
use crate::scaler::StandardScaler;

/// Version written into metadata for newly trained models
pub const MODEL_VERSION: &str = "1.0.0";

pub const PREDICTOR_FILE: &str = "lead_predictor.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {}: {source}", path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Incompatible artifact: {0}")]
    Incompatible(String),
}

/// Resolved artifact locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub directory: PathBuf,
    pub predictor: PathBuf,
    pub scaler: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        Self {
            predictor: directory.join(PREDICTOR_FILE),
            scaler: directory.join(SCALER_FILE),
            metadata: directory.join(METADATA_FILE),
            directory,
        }
    }

    /// True when both model files are present
    pub fn model_exists(&self) -> bool {
        self.predictor.exists() && self.scaler.exists()
    }
}

/// Persisted description of the current model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,

    /// UTC time of the last successful training; `None` when never trained
    #[serde(default, deserialize_with = "deserialize_training_date")]
    pub training_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub num_samples: usize,

    /// All zeros until the first training
    #[serde(default)]
    pub performance_metrics: PerformanceMetrics,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            version: MODEL_VERSION.to_string(),
            training_date: None,
            num_samples: 0,
            performance_metrics: PerformanceMetrics::default(),
        }
    }
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 ones, the latter read as UTC
fn deserialize_training_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

/// Forest and scaler fitted together
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub forest: RandomForest,
    pub scaler: StandardScaler,
}

impl ModelArtifacts {
    /// Reject artifacts that do not match the current feature layout
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if !self.scaler.is_compatible() {
            return Err(ArtifactError::Incompatible(format!(
                "scaler expects {} features, layout has {}",
                self.scaler.dimension(),
                FEATURE_COUNT
            )));
        }
        if self.forest.n_features != FEATURE_COUNT {
            return Err(ArtifactError::Incompatible(format!(
                "forest expects {} features, layout has {}",
                self.forest.n_features, FEATURE_COUNT
            )));
        }
        if !self.forest.is_well_formed() {
            return Err(ArtifactError::Incompatible(
                "forest structure is invalid".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate forest and scaler
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let artifacts = Self {
            forest: read_json(&paths.predictor)?,
            scaler: read_json(&paths.scaler)?,
        };
        artifacts.validate()?;
        Ok(artifacts)
    }

    /// Persist forest, scaler and metadata
    pub fn save(&self, paths: &ArtifactPaths, metadata: &ModelMetadata) -> Result<(), ArtifactError> {
        fs::create_dir_all(&paths.directory).map_err(|source| ArtifactError::Io {
            path: paths.directory.clone(),
            source,
        })?;

        write_json_atomic(&paths.predictor, &self.forest)?;
        write_json_atomic(&paths.scaler, &self.scaler)?;
        write_json_atomic(&paths.metadata, metadata)?;
        Ok(())
    }
}

/// Read metadata, falling back to defaults when absent or unreadable
pub fn load_metadata(paths: &ArtifactPaths) -> ModelMetadata {
    if !paths.metadata.exists() {
        return ModelMetadata::default();
    }

    match read_json(&paths.metadata) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read model metadata, using defaults");
            ModelMetadata::default()
        }
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let data = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ArtifactError::Serde {
        path: path.to_path_buf(),
        source,
    })
}

/// Write pretty JSON through a sibling temp file and rename it into place
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Serde {
        path: path.to_path_buf(),
        source,
    })?;

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let paths = ArtifactPaths::new("/tmp/models");
        assert_eq!(paths.predictor, PathBuf::from("/tmp/models/lead_predictor.json"));
        assert_eq!(paths.scaler, PathBuf::from("/tmp/models/scaler.json"));
        assert_eq!(paths.metadata, PathBuf::from("/tmp/models/metadata.json"));
    }

    #[test]
    fn test_default_metadata() {
        let metadata = ModelMetadata::default();
        assert_eq!(metadata.version, "1.0.0");
        assert!(metadata.training_date.is_none());
        assert_eq!(metadata.num_samples, 0);

        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json["performance_metrics"].is_object());
    }

    #[test]
    fn test_naive_training_date_is_utc() {
        let json = r#"{"version":"1.0.0","training_date":"2024-03-05T10:20:30.123456","num_samples":12,"performance_metrics":{}}"#;
        let metadata: ModelMetadata = serde_json::from_str(json).unwrap();
        let date = metadata.training_date.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 5));
        assert_eq!((date.hour(), date.minute(), date.second()), (10, 20, 30));
        assert_eq!(metadata.num_samples, 12);
        assert_eq!(metadata.performance_metrics, PerformanceMetrics::default());
    }

    #[test]
    fn test_rfc3339_training_date() {
        let json = r#"{"version":"1.0.0","training_date":"2024-03-05T12:00:00+02:00"}"#;
        let metadata: ModelMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.training_date.unwrap().hour(), 10);
    }

    #[test]
    fn test_null_training_date() {
        let json = r#"{"version":"1.0.0","training_date":null,"num_samples":0}"#;
        let metadata: ModelMetadata = serde_json::from_str(json).unwrap();
        assert!(metadata.training_date.is_none());
    }

    #[test]
    fn test_atomic_write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.json");
        let metadata = ModelMetadata {
            num_samples: 42,
            training_date: Some(Utc::now()),
            ..Default::default()
        };

        write_json_atomic(&path, &metadata).unwrap();
        let restored: ModelMetadata = read_json(&path).unwrap();
        assert_eq!(restored, metadata);

        // Only the target remains, no temp files
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_corrupt_metadata_falls_back() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        fs::write(&paths.metadata, b"not json").unwrap();
        assert_eq!(load_metadata(&paths), ModelMetadata::default());
    }

    #[test]
    fn test_missing_artifacts_fail_to_load() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        assert!(!paths.model_exists());
        assert!(matches!(
            ModelArtifacts::load(&paths),
            Err(ArtifactError::Io { .. })
        ));
    }
}
