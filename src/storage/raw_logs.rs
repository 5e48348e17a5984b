//! Raw capture log storage.
//!
//! One JSON file per captured sample, named `<user_id>_<epoch_millis>.json`.

use chrono::Utc;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Label used when a capture arrives without a user id.
pub const UNKNOWN_USER: &str = "unknown";

/// Raw log storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Directory of raw capture logs.
#[derive(Debug, Clone)]
pub struct RawLogStore {
    dir: PathBuf,
}

impl RawLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one captured sample and return the path it was written to.
    pub fn save(&self, sample: &Value) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let user = sanitize_user_id(sample.get("user_id"));
        let stem = format!("{user}_{}", Utc::now().timestamp_millis());
        let content = serde_json::to_string_pretty(sample)?;
        let (path, mut file) = self.create_unique(&stem)?;

        file.write_all(content.as_bytes()).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// All stored logs, sorted by file name. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Read one stored sample.
    pub fn load(path: &Path) -> Result<Value, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Two captures in the same millisecond get a numeric suffix. The file
    /// is claimed atomically so concurrent saves never share a name.
    fn create_unique(&self, stem: &str) -> Result<(PathBuf, File), StoreError> {
        let mut path = self.dir.join(format!("{stem}.json"));
        let mut n = 1;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    path = self.dir.join(format!("{stem}-{n}.json"));
                    n += 1;
                }
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
    }
}

/// Make a user id safe to embed in a file name.
fn sanitize_user_id(value: Option<&Value>) -> String {
    let raw = match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        UNKNOWN_USER.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_user_id() {
        assert_eq!(sanitize_user_id(Some(&json!("alice"))), "alice");
        assert_eq!(sanitize_user_id(Some(&json!(7))), "7");
        assert_eq!(sanitize_user_id(Some(&json!("../etc/passwd"))), "___etc_passwd");
        assert_eq!(sanitize_user_id(Some(&json!(""))), UNKNOWN_USER);
        assert_eq!(sanitize_user_id(None), UNKNOWN_USER);
    }

    #[test]
    fn test_save_list_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawLogStore::new(dir.path().join("raw_logs"));
        assert!(store.list().unwrap().is_empty());

        let sample = json!({"user_id": "u1", "events": []});
        let first = store.save(&sample).unwrap();
        let second = store.save(&sample).unwrap();
        assert_ne!(first, second);

        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("u1_"));
        assert!(name.ends_with(".json"));

        let files = store.list().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(RawLogStore::load(&files[0]).unwrap(), sample);
    }

    #[test]
    fn test_concurrent_saves_keep_every_sample() {
        use std::collections::HashSet;
        use std::sync::{Arc, Barrier};

        const WRITERS: usize = 16;

        let dir = tempfile::tempdir().unwrap();
        let store = RawLogStore::new(dir.path().join("raw_logs"));
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store
                        .save(&json!({"user_id": "alice", "events": [], "n": i}))
                        .unwrap()
                })
            })
            .collect();

        let paths: HashSet<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(paths.len(), WRITERS);

        let files = store.list().unwrap();
        assert_eq!(files.len(), WRITERS);

        let mut seen: Vec<u64> = files
            .iter()
            .map(|f| RawLogStore::load(f).unwrap()["n"].as_u64().unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..WRITERS as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            RawLogStore::load(&path),
            Err(StoreError::Parse { .. })
        ));
    }
}
