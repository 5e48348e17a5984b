//! Core keystroke feature computation.
//!
//! This module contains:
//! - Canonical keystroke event types
//! - Pairing of press and release events into key presses
//! - Dwell/flight interval statistics
//! - Feature vector assembly
//!
//! Everything here is pure and synchronous: no I/O, no logging, no state kept
//! between samples.

pub mod events;
pub mod features;
pub mod pairing;
pub mod stats;

// Re-export commonly used types
pub use events::{KeyEvent, KeyKind, KeyPress};
pub use features::{compute_features, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use pairing::pair_events;
pub use stats::{dwell_times, flight_times, IntervalStats};
