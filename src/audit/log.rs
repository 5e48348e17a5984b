//! Processing counters for extraction and prediction.
//!
//! Counts only; no sample content, key identities or timings are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current process, optionally persisted across runs.
#[derive(Debug)]
pub struct AuditLog {
    /// Samples turned into feature vectors
    samples_extracted: AtomicU64,
    /// Samples rejected by validation
    samples_rejected: AtomicU64,
    /// Individual events skipped during normalization
    malformed_events: AtomicU64,
    /// Predictions returned to callers
    predictions_served: AtomicU64,
    /// Raw capture logs written
    logs_saved: AtomicU64,
    /// Process start time
    started_at: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            samples_extracted: AtomicU64::new(0),
            samples_rejected: AtomicU64::new(0),
            malformed_events: AtomicU64::new(0),
            predictions_served: AtomicU64::new(0),
            logs_saved: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that resumes from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "could not load previous audit stats");
        }

        log
    }

    pub fn record_extracted(&self, malformed_events: usize) {
        self.samples_extracted.fetch_add(1, Ordering::Relaxed);
        self.malformed_events
            .fetch_add(malformed_events as u64, Ordering::Relaxed);
    }

    /// Record the outcome of a whole dataset build.
    pub fn record_batch(&self, extracted: u64, rejected: u64, malformed_events: u64) {
        self.samples_extracted.fetch_add(extracted, Ordering::Relaxed);
        self.samples_rejected.fetch_add(rejected, Ordering::Relaxed);
        self.malformed_events
            .fetch_add(malformed_events, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.samples_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction(&self) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_log_saved(&self) {
        self.logs_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            samples_extracted: self.samples_extracted.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            logs_saved: self.logs_saved.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Processing Statistics:\n\
             - Samples extracted: {}\n\
             - Samples rejected: {}\n\
             - Malformed events skipped: {}\n\
             - Predictions served: {}\n\
             - Raw logs saved: {}\n\
             - Uptime: {} seconds",
            stats.samples_extracted,
            stats.samples_rejected,
            stats.malformed_events,
            stats.predictions_served,
            stats.logs_saved,
            stats.uptime_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_extracted: stats.samples_extracted,
                samples_rejected: stats.samples_rejected,
                malformed_events: stats.malformed_events,
                predictions_served: stats.predictions_served,
                logs_saved: stats.logs_saved,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_extracted
                    .store(persisted.samples_extracted, Ordering::Relaxed);
                self.samples_rejected
                    .store(persisted.samples_rejected, Ordering::Relaxed);
                self.malformed_events
                    .store(persisted.malformed_events, Ordering::Relaxed);
                self.predictions_served
                    .store(persisted.predictions_served, Ordering::Relaxed);
                self.logs_saved
                    .store(persisted.logs_saved, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the audit counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub samples_extracted: u64,
    pub samples_rejected: u64,
    pub malformed_events: u64,
    pub predictions_served: u64,
    pub logs_saved: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_extracted: u64,
    samples_rejected: u64,
    malformed_events: u64,
    predictions_served: u64,
    logs_saved: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(AuditLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}
