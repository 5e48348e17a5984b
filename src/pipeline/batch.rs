//! Batch entry point: labeled training rows from stored capture logs.

use crate::core::features::{FeatureVector, FEATURE_NAMES};
use crate::pipeline::normalize::{MalformedEvent, ValidationError, BATCH_SCHEMA};
use crate::pipeline::{extract, Extraction};
use crate::storage::{RawLogStore, StoreError};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Field holding the identity label of a stored sample.
pub const LABEL_FIELD: &str = "user_id";

/// Provenance column appended after the label.
pub const FILE_COLUMN: &str = "file";

/// Dataset building errors.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sample: {0}")]
    Validation(#[from] ValidationError),
}

/// One row of the training dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub features: FeatureVector,
    pub user_id: String,
    /// Source file name, if the sample came from disk
    pub file: Option<String>,
}

/// Counters for one dataset build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Samples turned into rows
    pub samples: usize,
    /// Samples skipped because they were unreadable or invalid
    pub rejected: usize,
    /// Individual events skipped inside accepted samples
    pub malformed_events: usize,
}

/// Feature vector of a stored sample (`events` list, `t` timestamps).
pub fn extract_batch(sample: &Value) -> Result<Extraction, ValidationError> {
    extract(sample, &BATCH_SCHEMA)
}

/// Labeled dataset row of a stored sample.
pub fn extract_row(
    sample: &Value,
    file: Option<&str>,
) -> Result<(DatasetRow, Vec<MalformedEvent>), ValidationError> {
    let user_id = match sample.get(LABEL_FIELD) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ValidationError::MissingLabel { field: LABEL_FIELD }),
    };

    let extraction = extract_batch(sample)?;
    let row = DatasetRow {
        features: extraction.features,
        user_id,
        file: file.map(str::to_string),
    };

    Ok((row, extraction.malformed))
}

/// Accumulates labeled rows and writes them as a CSV dataset.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    rows: Vec<DatasetRow>,
    report: BuildReport,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one in-memory sample.
    pub fn add_sample(
        &mut self,
        sample: &Value,
        file: Option<&str>,
    ) -> Result<(), ValidationError> {
        match extract_row(sample, file) {
            Ok((row, malformed)) => {
                self.report.samples += 1;
                self.report.malformed_events += malformed.len();
                self.rows.push(row);
                Ok(())
            }
            Err(e) => {
                self.report.rejected += 1;
                Err(e)
            }
        }
    }

    /// Add one stored sample file.
    pub fn add_file(&mut self, path: &Path) -> Result<(), DatasetError> {
        let sample = match RawLogStore::load(path) {
            Ok(sample) => sample,
            Err(e) => {
                self.report.rejected += 1;
                return Err(e.into());
            }
        };

        let file = path.file_name().map(|f| f.to_string_lossy().into_owned());
        self.add_sample(&sample, file.as_deref())?;
        Ok(())
    }

    /// Add every sample in a raw log store.
    ///
    /// Bad files are logged and counted; they never abort the build.
    pub fn add_store(&mut self, store: &RawLogStore) -> Result<(), DatasetError> {
        for path in store.list()? {
            if let Err(e) = self.add_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "skipping sample");
            }
        }

        tracing::info!(
            samples = self.report.samples,
            rejected = self.report.rejected,
            malformed_events = self.report.malformed_events,
            "dataset built from {}",
            store.dir().display()
        );
        Ok(())
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }

    /// Header row: the feature columns in canonical order, then label and file.
    pub fn header() -> Vec<&'static str> {
        FEATURE_NAMES
            .iter()
            .copied()
            .chain([LABEL_FIELD, FILE_COLUMN])
            .collect()
    }

    /// Write the dataset as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(Self::header())?;

        for row in &self.rows {
            let mut record: Vec<String> = row.features.as_array()[..FEATURE_NAMES.len() - 1]
                .iter()
                .map(f64::to_string)
                .collect();
            record.push(row.features.n_keys().to_string());
            record.push(row.user_id.clone());
            record.push(row.file.clone().unwrap_or_default());
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write the dataset to `path`, creating parent directories.
    pub fn write_to_path(&self, path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}
