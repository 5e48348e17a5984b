//! Feature vector assembly.
//!
//! The classifier consumes a positional vector and knows nothing about field
//! names, so the column order in [`FEATURE_NAMES`] is the contract between
//! the training dataset and live prediction requests.

use crate::core::events::KeyEvent;
use crate::core::pairing::pair_events;
use crate::core::stats::{dwell_times, flight_times, IntervalStats};
use serde::{Deserialize, Serialize};

/// Number of features in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 9;

/// Canonical column order of a [`FeatureVector`].
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "dwell_mean",
    "dwell_std",
    "dwell_min",
    "dwell_max",
    "flight_mean",
    "flight_std",
    "flight_min",
    "flight_max",
    "n_keys",
];

/// Fixed-order numeric summary of one typing sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Lay out dwell stats, flight stats and the press count in canonical order.
    ///
    /// `n_keys` counts every completed press, including those left out of the
    /// dwell set.
    pub fn assemble(dwell: IntervalStats, flight: IntervalStats, n_keys: usize) -> Self {
        Self([
            dwell.mean,
            dwell.std,
            dwell.min,
            dwell.max,
            flight.mean,
            flight.std,
            flight.min,
            flight.max,
            n_keys as f64,
        ])
    }

    /// Wrap values that are already in canonical order (e.g. scaler output).
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn into_array(self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn dwell(&self) -> IntervalStats {
        IntervalStats {
            mean: self.0[0],
            std: self.0[1],
            min: self.0[2],
            max: self.0[3],
        }
    }

    pub fn flight(&self) -> IntervalStats {
        IntervalStats {
            mean: self.0[4],
            std: self.0[5],
            min: self.0[6],
            max: self.0[7],
        }
    }

    pub fn n_keys(&self) -> usize {
        self.0[8] as usize
    }

    /// Iterate `(name, value)` pairs in canonical order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    /// Exact equality, distinguishing `0.0` from `-0.0`.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Compute the feature vector of one sample of canonical events.
///
/// This is the single transformation behind both the batch and the online
/// entry points.
pub fn compute_features(events: &[KeyEvent]) -> FeatureVector {
    let presses = pair_events(events);
    let dwell = IntervalStats::from_intervals(&dwell_times(&presses));
    let flight = IntervalStats::from_intervals(&flight_times(&presses));

    FeatureVector::assemble(dwell, flight, presses.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_events_give_zero_vector() {
        let features = compute_features(&[]);
        assert_eq!(features.into_array(), [0.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_two_key_scenario() {
        let events = vec![
            KeyEvent::down("a", 100.0),
            KeyEvent::up("a", 150.0),
            KeyEvent::down("b", 160.0),
            KeyEvent::up("b", 260.0),
        ];

        let features = compute_features(&events);
        let dwell = features.dwell();
        let flight = features.flight();

        assert!((dwell.mean - 80.0).abs() < 1e-9);
        assert!((dwell.std - 30.0).abs() < 1e-9);
        assert_eq!(dwell.min, 50.0);
        assert_eq!(dwell.max, 110.0);
        assert_eq!(flight.mean, 10.0);
        assert_eq!(flight.std, 0.0);
        assert_eq!(flight.min, 10.0);
        assert_eq!(flight.max, 10.0);
        assert_eq!(features.n_keys(), 2);
    }

    #[test]
    fn test_single_press() {
        let events = vec![KeyEvent::down("a", 10.0), KeyEvent::up("a", 95.0)];
        let features = compute_features(&events);

        assert_eq!(features.flight(), IntervalStats::default());
        assert_eq!(features.dwell().min, features.dwell().max);
        assert_eq!(features.dwell().mean, features.dwell().min);
        assert_eq!(features.dwell().std, 0.0);
        assert_eq!(features.n_keys(), 1);
    }

    #[test]
    fn test_non_positive_dwell_still_counts_key() {
        let events = vec![
            KeyEvent::down("a", 100.0),
            KeyEvent::up("a", 100.0),
            KeyEvent::down("b", 200.0),
            KeyEvent::up("b", 240.0),
        ];

        let features = compute_features(&events);
        assert_eq!(features.n_keys(), 2);
        assert_eq!(features.dwell().mean, 40.0);
        assert_eq!(features.dwell().min, 40.0);
        // flight still uses the zero-length press: 200 - 100
        assert_eq!(features.flight().mean, 100.0);
    }

    #[test]
    fn test_feature_order() {
        let dwell = IntervalStats {
            mean: 1.0,
            std: 2.0,
            min: 3.0,
            max: 4.0,
        };
        let flight = IntervalStats {
            mean: 5.0,
            std: 6.0,
            min: 7.0,
            max: 8.0,
        };
        let features = FeatureVector::assemble(dwell, flight, 9);
        assert_eq!(
            features.into_array(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );

        let names: Vec<&str> = features.named().map(|(n, _)| n).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let features = FeatureVector::from_array([0.5; FEATURE_COUNT]);
        let json = serde_json::to_value(features).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(FEATURE_COUNT));
    }
}
