//! Keystroke event types.
//!
//! A [`KeyEvent`] is one observed keyboard action in canonical form. Field-name
//! drift from capture clients is resolved before anything in this module sees
//! the data (see [`crate::pipeline::normalize`]).

use serde::{Deserialize, Serialize};

/// Whether an event is a key press or a key release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Down,
    Up,
}

impl KeyKind {
    /// Parse the wire value used by capture clients (`"down"` / `"up"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "down" => Some(KeyKind::Down),
            "up" => Some(KeyKind::Up),
            _ => None,
        }
    }
}

/// One observed keyboard action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Symbolic key identifier, compared for equality only
    pub key: String,
    /// Monotonic time in milliseconds
    pub timestamp: f64,
    /// Press or release
    pub kind: KeyKind,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, timestamp: f64, kind: KeyKind) -> Self {
        Self {
            key: key.into(),
            timestamp,
            kind,
        }
    }

    pub fn down(key: impl Into<String>, timestamp: f64) -> Self {
        Self::new(key, timestamp, KeyKind::Down)
    }

    pub fn up(key: impl Into<String>, timestamp: f64) -> Self {
        Self::new(key, timestamp, KeyKind::Up)
    }
}

/// A completed press/release cycle for one key.
///
/// `up_time` is not guaranteed to exceed `down_time`; out-of-order delivery
/// can produce a pair with non-positive duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: String,
    pub down_time: f64,
    pub up_time: f64,
}

impl KeyPress {
    /// Hold duration, or `None` when the release does not follow the press.
    pub fn dwell(&self) -> Option<f64> {
        (self.up_time > self.down_time).then(|| self.up_time - self.down_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(KeyKind::parse("down"), Some(KeyKind::Down));
        assert_eq!(KeyKind::parse("up"), Some(KeyKind::Up));
        assert_eq!(KeyKind::parse("Down"), None);
        assert_eq!(KeyKind::parse("press"), None);
    }

    #[test]
    fn test_dwell_requires_positive_duration() {
        let press = KeyPress {
            key: "a".into(),
            down_time: 100.0,
            up_time: 150.0,
        };
        assert_eq!(press.dwell(), Some(50.0));

        let skewed = KeyPress {
            key: "a".into(),
            down_time: 100.0,
            up_time: 100.0,
        };
        assert_eq!(skewed.dwell(), None);
    }
}
