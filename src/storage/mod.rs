//! Persistence of raw capture logs consumed by the batch pipeline.

pub mod raw_logs;

pub use raw_logs::{RawLogStore, StoreError, UNKNOWN_USER};
