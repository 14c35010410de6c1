//! Standard feature scaler
//!
//! Centers each column on its mean and divides by its population standard
//! deviation. Constant columns keep a unit scale so they map to zero instead
//! of dividing by zero.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::features::{layout_matches, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

/// Fitted standardization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Layout the scaler was fitted on
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on a `(samples, features)` matrix
    pub fn fit(x: ArrayView2<'_, f64>) -> Self {
        let n_features = x.ncols();
        let mean = x
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; n_features]);
        let scale = x
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|s| if *s > f64::EPSILON { *s } else { 1.0 })
            .collect();

        Self {
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            mean,
            scale,
        }
    }

    /// Number of features the scaler expects
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// True when the scaler fits the current feature layout
    pub fn is_compatible(&self) -> bool {
        self.dimension() == FEATURE_COUNT
            && self.scale.len() == FEATURE_COUNT
            && layout_matches(&self.feature_names)
    }

    /// Standardize a whole matrix
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[j]) / self.scale[j];
            }
        }
        out
    }

    /// Standardize one feature vector
    pub fn transform_row(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = *features;
        for (j, value) in out.iter_mut().enumerate() {
            *value = (*value - self.mean[j]) / self.scale[j];
        }
        out
    }
}
