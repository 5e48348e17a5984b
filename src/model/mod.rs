//! Classifier contract.
//!
//! The identity model is produced elsewhere and treated as opaque: a
//! [`Scaler`] standardizes the feature vector, then a [`Classifier`] maps it
//! to a user identity. Both are loaded once and shared read-only through a
//! [`ModelHandle`], which has an explicit unavailable state.
//!
//! # Usage
//!
//! ```no_run
//! use keystroke_id::model::ModelHandle;
//!
//! let model = ModelHandle::load(std::path::Path::new("models")).unwrap();
//! if !model.is_available() {
//!     eprintln!("train a model first");
//! }
//! ```

mod artifacts;

pub use artifacts::{Centroid, CentroidClassifier, StandardScaler, CLASSIFIER_FILE, SCALER_FILE};

use crate::core::features::FeatureVector;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Model errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No classifier/scaler pair is loaded
    #[error("model not loaded; train the model first")]
    Unavailable,
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Feature standardization applied before classification.
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> FeatureVector;
}

/// Maps a scaled feature vector to a user identity.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<String, ModelError>;
}

struct LoadedModel {
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
}

/// Shared, read-only handle to the loaded scaler and classifier.
///
/// Cloning is cheap; all clones see the same model.
#[derive(Clone, Default)]
pub struct ModelHandle {
    model: Option<Arc<LoadedModel>>,
}

impl ModelHandle {
    /// A handle with no model loaded.
    pub fn unavailable() -> Self {
        Self { model: None }
    }

    pub fn new(scaler: impl Scaler + 'static, classifier: impl Classifier + 'static) -> Self {
        Self {
            model: Some(Arc::new(LoadedModel {
                scaler: Box::new(scaler),
                classifier: Box::new(classifier),
            })),
        }
    }

    /// Load `scaler.json` and `classifier.json` from `dir`.
    ///
    /// If either file is missing the handle is unavailable rather than an
    /// error; a file that exists but cannot be parsed is an error.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let scaler_path = dir.join(SCALER_FILE);
        let classifier_path = dir.join(CLASSIFIER_FILE);

        if !scaler_path.exists() || !classifier_path.exists() {
            tracing::warn!(dir = %dir.display(), "model or scaler not found; prediction disabled");
            return Ok(Self::unavailable());
        }

        let scaler = StandardScaler::load(&scaler_path)?;
        let classifier = CentroidClassifier::load(&classifier_path)?;
        tracing::info!(
            dir = %dir.display(),
            classes = classifier.labels().count(),
            "model and scaler loaded"
        );

        Ok(Self::new(scaler, classifier))
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Fail with [`ModelError::Unavailable`] when nothing is loaded.
    pub fn ensure_available(&self) -> Result<(), ModelError> {
        self.model.as_ref().map(|_| ()).ok_or(ModelError::Unavailable)
    }

    /// Scale, then classify.
    pub fn predict(&self, features: &FeatureVector) -> Result<String, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::Unavailable)?;
        let scaled = model.scaler.transform(features);
        model.classifier.predict(&scaled)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("available", &self.is_available())
            .finish()
    }
}
