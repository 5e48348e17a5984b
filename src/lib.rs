//! keystroke-id - identify a typist from keystroke timing.
//!
//! Raw key-down/key-up timestamps from one capture session are reduced to a
//! fixed 9-value fingerprint of dwell and flight time statistics, which a
//! trained classifier maps to a user identity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          keystroke-id                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  stored logs ──▶ batch ──┐                                      │
//! │                          ├─▶ normalize ─▶ pair ─▶ stats ─▶ vec  │
//! │  live sample ──▶ online ─┘                               │      │
//! │                                    ┌─────────────────────┤      │
//! │                                    ▼                     ▼      │
//! │                             dataset CSV         scaler ─▶ model │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use keystroke_id::pipeline::extract_online;
//!
//! let sample = serde_json::json!({
//!     "events": [
//!         {"key": "a", "t": 100, "type": "down"},
//!         {"key": "a", "t": 150, "type": "up"},
//!         {"key": "b", "t": 160, "type": "down"},
//!         {"key": "b", "t": 260, "type": "up"}
//!     ]
//! });
//!
//! let features = extract_online(&sample).unwrap().features;
//! assert_eq!(features.n_keys(), 2);
//! assert_eq!(features.flight().mean, 10.0);
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod model;
pub mod pipeline;
pub mod storage;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use config::{Config, ConfigError};
pub use crate::core::{compute_features, FeatureVector, IntervalStats, KeyEvent, KeyKind, KeyPress};
pub use model::{Classifier, ModelError, ModelHandle, Scaler};
pub use pipeline::{
    extract_batch, extract_online, predict, DatasetBuilder, DatasetRow, PredictError, Prediction,
    ValidationError,
};
pub use storage::RawLogStore;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
