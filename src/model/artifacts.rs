//! JSON model artifacts exported by the training job.
//!
//! `scaler.json`: `{"mean": [9], "scale": [9]}`
//!
//! `classifier.json`: `{"centroids": [{"label": "...", "center": [9]}, ...]}`
//!
//! Centers are expressed in scaled feature space.

use super::{Classifier, ModelError, Scaler};
use crate::core::features::{FeatureVector, FEATURE_COUNT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let scaler: Self = read_json(path)?;
        if scaler.mean.iter().chain(&scaler.scale).any(|v| !v.is_finite()) {
            return Err(ModelError::Invalid(format!(
                "{} contains non-finite values",
                path.display()
            )));
        }
        Ok(scaler)
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in features.as_array().iter().enumerate() {
            // constant training columns have zero scale
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            out[i] = (value - self.mean[i]) / scale;
        }
        FeatureVector::from_array(out)
    }
}

/// One class center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub label: String,
    pub center: [f64; FEATURE_COUNT],
}

/// Nearest-centroid classifier (Euclidean distance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidClassifier {
    pub centroids: Vec<Centroid>,
}

impl CentroidClassifier {
    pub fn new(centroids: Vec<Centroid>) -> Result<Self, ModelError> {
        if centroids.is_empty() {
            return Err(ModelError::Invalid("classifier has no centroids".to_string()));
        }
        Ok(Self { centroids })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let classifier: Self = read_json(path)?;
        Self::new(classifier.centroids)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|c| c.label.as_str())
    }
}

impl Classifier for CentroidClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<String, ModelError> {
        let x = features.as_array();

        self.centroids
            .iter()
            .map(|c| {
                let dist: f64 = c
                    .center
                    .iter()
                    .zip(x.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (c, dist)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.label.clone())
            .ok_or_else(|| ModelError::Invalid("classifier has no centroids".to_string()))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centroid(label: &str, fill: f64) -> Centroid {
        Centroid {
            label: label.to_string(),
            center: [fill; FEATURE_COUNT],
        }
    }

    #[test]
    fn test_scaler_transform() {
        let scaler = StandardScaler {
            mean: [10.0; FEATURE_COUNT],
            scale: [2.0; FEATURE_COUNT],
        };
        let scaled = scaler.transform(&FeatureVector::from_array([14.0; FEATURE_COUNT]));
        assert_eq!(scaled.into_array(), [2.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_scaler_zero_scale() {
        let scaler = StandardScaler {
            mean: [1.0; FEATURE_COUNT],
            scale: [0.0; FEATURE_COUNT],
        };
        let scaled = scaler.transform(&FeatureVector::from_array([3.0; FEATURE_COUNT]));
        assert_eq!(scaled.into_array(), [2.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_nearest_centroid() {
        let classifier =
            CentroidClassifier::new(vec![centroid("alice", -1.0), centroid("bob", 1.0)]).unwrap();

        let near_bob = FeatureVector::from_array([0.8; FEATURE_COUNT]);
        assert_eq!(classifier.predict(&near_bob).unwrap(), "bob");

        let near_alice = FeatureVector::from_array([-0.3; FEATURE_COUNT]);
        assert_eq!(classifier.predict(&near_alice).unwrap(), "alice");
    }

    #[test]
    fn test_empty_classifier_rejected() {
        assert!(matches!(
            CentroidClassifier::new(Vec::new()),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SCALER_FILE),
            r#"{"mean": [0,0,0,0,0,0,0,0,0], "scale": [1,1,1,1,1,1,1,1,1]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CLASSIFIER_FILE),
            r#"{"centroids": [{"label": "alice", "center": [0,0,0,0,0,0,0,0,0]}]}"#,
        )
        .unwrap();

        let scaler = StandardScaler::load(&dir.path().join(SCALER_FILE)).unwrap();
        assert_eq!(scaler.scale, [1.0; FEATURE_COUNT]);

        let classifier = CentroidClassifier::load(&dir.path().join(CLASSIFIER_FILE)).unwrap();
        assert_eq!(classifier.labels().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[test]
    fn test_load_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SCALER_FILE);
        std::fs::write(&path, r#"{"mean": [1, 2]}"#).unwrap();
        assert!(matches!(
            StandardScaler::load(&path),
            Err(ModelError::Parse { .. })
        ));
    }
}
