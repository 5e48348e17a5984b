//! Dwell and flight interval sets and their summary statistics.

use crate::core::events::KeyPress;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary of one interval set.
///
/// An empty set reduces to all zeros, never NaN, so that a near-empty capture
/// still yields a fully populated feature vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    pub mean: f64,
    /// Population standard deviation (divides by N)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl IntervalStats {
    /// Reduce a set of durations.
    pub fn from_intervals(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        Self {
            mean: Statistics::<f64>::mean(values),
            std: Statistics::<f64>::population_std_dev(values),
            min: Statistics::<f64>::min(values),
            max: Statistics::<f64>::max(values),
        }
    }
}

/// Hold durations of every press whose release strictly follows its press.
pub fn dwell_times(presses: &[KeyPress]) -> Vec<f64> {
    presses.iter().filter_map(KeyPress::dwell).collect()
}

/// Gaps between one release and the next press, in press order.
///
/// Overlapping keystrokes give negative values; they are kept.
pub fn flight_times(presses: &[KeyPress]) -> Vec<f64> {
    presses
        .windows(2)
        .map(|pair| pair[1].down_time - pair[0].up_time)
        .collect()
}
