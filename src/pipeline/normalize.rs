//! Boundary normalization of captured samples into canonical key events.
//!
//! Capture clients disagree on field names. Each accepted spelling is listed
//! once, in priority order, in a [`Schema`]; after normalization nothing
//! downstream looks at raw field names again.

use crate::core::events::{KeyEvent, KeyKind};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field holding the key identifier of an event.
pub const KEY_FIELD: &str = "key";

/// Field holding the event type (`"down"` / `"up"`).
pub const TYPE_FIELD: &str = "type";

/// Accepted field names for one entry point, highest priority first.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Names under which the event list may appear
    pub event_lists: &'static [&'static str],
    /// Names under which an event's timestamp may appear
    pub timestamps: &'static [&'static str],
}

/// Stored capture logs: `{user_id, events: [{key, t, type}, ...]}`.
pub const BATCH_SCHEMA: Schema = Schema {
    event_lists: &["events"],
    timestamps: &["t"],
};

/// Live prediction requests, which arrive from several client versions.
pub const ONLINE_SCHEMA: Schema = Schema {
    event_lists: &["events", "key_events"],
    timestamps: &["t", "time", "press_time"],
};

/// Why a single event could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedReason {
    #[error("event is not an object")]
    NotAnObject,
    #[error("missing key")]
    MissingKey,
    #[error("key is neither a string nor a number")]
    InvalidKey,
    #[error("missing timestamp")]
    MissingTimestamp,
    #[error("timestamp is not a non-negative number")]
    InvalidTimestamp,
    #[error("missing type")]
    MissingType,
    #[error("unknown event type '{0}'")]
    UnknownType(String),
}

/// An event that was skipped during normalization.
///
/// Skipping is not fatal; the sample is only rejected when no usable event
/// remains.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("event {index} skipped: {reason}")]
pub struct MalformedEvent {
    /// Position of the event in the submitted list
    pub index: usize,
    pub reason: MalformedReason,
}

/// A sample that cannot produce a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sample is not a JSON object")]
    NotAnObject,
    #[error("no event list found (expected one of {tried:?})")]
    MissingEventList { tried: &'static [&'static str] },
    #[error("field '{field}' is not a list of events")]
    InvalidEventList { field: &'static str },
    #[error("event list is empty")]
    EmptyEventList,
    #[error("no usable key events ({malformed} malformed)")]
    NoUsableEvents { malformed: usize },
    #[error("sample has no usable '{field}' label")]
    MissingLabel { field: &'static str },
}

/// Canonical events of one sample plus the events that were skipped.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSample {
    pub events: Vec<KeyEvent>,
    pub malformed: Vec<MalformedEvent>,
}

impl Schema {
    /// Resolve the event list and convert every event to canonical form.
    pub fn normalize(&self, sample: &Value) -> Result<NormalizedSample, ValidationError> {
        let obj = sample.as_object().ok_or(ValidationError::NotAnObject)?;
        let raw_events = self.locate_events(obj)?;

        let mut normalized = NormalizedSample::default();
        for (index, raw) in raw_events.iter().enumerate() {
            match self.normalize_event(raw) {
                Ok(event) => normalized.events.push(event),
                Err(reason) => normalized.malformed.push(MalformedEvent { index, reason }),
            }
        }

        if normalized.events.is_empty() {
            return Err(ValidationError::NoUsableEvents {
                malformed: normalized.malformed.len(),
            });
        }

        Ok(normalized)
    }

    /// First alias holding a non-empty list wins. `null` counts as absent.
    fn locate_events<'a>(
        &self,
        obj: &'a Map<String, Value>,
    ) -> Result<&'a [Value], ValidationError> {
        let mut invalid = None;
        let mut empty = false;

        for &field in self.event_lists {
            match obj.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(events)) if !events.is_empty() => return Ok(events.as_slice()),
                Some(Value::Array(_)) => empty = true,
                Some(_) => {
                    invalid.get_or_insert(field);
                }
            }
        }

        if let Some(field) = invalid {
            Err(ValidationError::InvalidEventList { field })
        } else if empty {
            Err(ValidationError::EmptyEventList)
        } else {
            Err(ValidationError::MissingEventList {
                tried: self.event_lists,
            })
        }
    }

    fn normalize_event(&self, raw: &Value) -> Result<KeyEvent, MalformedReason> {
        let obj = raw.as_object().ok_or(MalformedReason::NotAnObject)?;

        let key = match present(obj, KEY_FIELD) {
            None => return Err(MalformedReason::MissingKey),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(MalformedReason::InvalidKey),
        };

        let timestamp = self
            .timestamps
            .iter()
            .find_map(|field| present(obj, field))
            .ok_or(MalformedReason::MissingTimestamp)?
            .as_f64()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| t + 0.0)
            .ok_or(MalformedReason::InvalidTimestamp)?;

        let kind = match present(obj, TYPE_FIELD) {
            None => return Err(MalformedReason::MissingType),
            Some(Value::String(s)) => {
                KeyKind::parse(s).ok_or_else(|| MalformedReason::UnknownType(s.clone()))?
            }
            Some(other) => return Err(MalformedReason::UnknownType(other.to_string())),
        };

        Ok(KeyEvent {
            key,
            timestamp,
            kind,
        })
    }
}

/// A field counts as present when it exists and is not `null`.
fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}
