//! Batch and online entry points over one shared feature pipeline.
//!
//! ```text
//!  stored capture log ──▶ BATCH_SCHEMA  ─┐
//!                                        ├─▶ normalize ─▶ compute_features ─▶ FeatureVector
//!  prediction request ──▶ ONLINE_SCHEMA ─┘
//! ```
//!
//! The entry points differ only in which field names they accept. Pairing,
//! interval statistics and assembly run through the same code for both.

pub mod batch;
pub mod normalize;
pub mod online;

pub use batch::{extract_batch, extract_row, BuildReport, DatasetBuilder, DatasetError, DatasetRow};
pub use normalize::{
    MalformedEvent, MalformedReason, NormalizedSample, Schema, ValidationError, BATCH_SCHEMA,
    ONLINE_SCHEMA,
};
pub use online::{extract_online, predict, PredictError, Prediction};

use crate::core::features::{compute_features, FeatureVector};
use serde_json::Value;

/// Feature vector of one sample and the events skipped on the way.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub features: FeatureVector,
    pub malformed: Vec<MalformedEvent>,
}

/// Normalize `sample` under `schema`, then run the shared core.
pub fn extract(sample: &Value, schema: &Schema) -> Result<Extraction, ValidationError> {
    let normalized = schema.normalize(sample)?;

    Ok(Extraction {
        features: compute_features(&normalized.events),
        malformed: normalized.malformed,
    })
}
