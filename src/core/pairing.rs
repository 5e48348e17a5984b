//! Pairing of key-down and key-up events into completed key presses.

use crate::core::events::{KeyEvent, KeyKind, KeyPress};
use std::collections::{HashMap, VecDeque};

/// Match every release to the oldest pending press of the same key.
///
/// Each key keeps a FIFO of pending press timestamps, so auto-repeat and
/// double presses before release pair up in order. A release with nothing
/// pending is dropped, and presses still pending at the end are discarded.
/// The result is sorted ascending by `down_time`; the sort is stable so equal
/// press times keep their emission order.
pub fn pair_events(events: &[KeyEvent]) -> Vec<KeyPress> {
    let mut pending: HashMap<&str, VecDeque<f64>> = HashMap::new();
    let mut presses = Vec::new();

    for event in events {
        match event.kind {
            KeyKind::Down => {
                pending
                    .entry(event.key.as_str())
                    .or_default()
                    .push_back(canonical_time(event.timestamp));
            }
            KeyKind::Up => {
                let Some(down_time) = pending
                    .get_mut(event.key.as_str())
                    .and_then(VecDeque::pop_front)
                else {
                    continue;
                };
                presses.push(KeyPress {
                    key: event.key.clone(),
                    down_time,
                    up_time: canonical_time(event.timestamp),
                });
            }
        }
    }

    presses.sort_by(|a, b| a.down_time.total_cmp(&b.down_time));
    presses
}

/// `-0.0` and `0.0` must tie under `total_cmp`.
fn canonical_time(t: f64) -> f64 {
    t + 0.0
}
