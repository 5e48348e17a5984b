//! Online entry point: one live sample, tolerant of field-name drift.

use crate::core::features::FeatureVector;
use crate::model::{ModelError, ModelHandle};
use crate::pipeline::normalize::{ValidationError, ONLINE_SCHEMA};
use crate::pipeline::{extract, Extraction};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Prediction failures.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A predicted identity together with the features it was predicted from.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub predicted_user: String,
    pub features: FeatureVector,
    /// Events skipped while normalizing the request
    pub skipped_events: usize,
}

/// Feature vector of a live sample.
///
/// The event list may be under `events` or `key_events`, and timestamps
/// under `t`, `time` or `press_time`.
pub fn extract_online(sample: &Value) -> Result<Extraction, ValidationError> {
    extract(sample, &ONLINE_SCHEMA)
}

/// Identify the typist of a live sample.
///
/// Model availability is checked before the sample is looked at.
pub fn predict(sample: &Value, model: &ModelHandle) -> Result<Prediction, PredictError> {
    model.ensure_available()?;

    let extraction = extract_online(sample)?;
    let predicted_user = model.predict(&extraction.features)?;

    Ok(Prediction {
        predicted_user,
        features: extraction.features,
        skipped_events: extraction.malformed.len(),
    })
}
