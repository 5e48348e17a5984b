//! Integration tests for the batch and online feature pipelines

use keystroke_id::core::{compute_features, KeyEvent, FEATURE_COUNT};
use keystroke_id::pipeline::{extract_batch, extract_online, extract_row, DatasetBuilder};
use keystroke_id::storage::RawLogStore;
use serde_json::{json, Value};

fn canonical(events: &[(&str, f64, &str)]) -> Value {
    let events: Vec<Value> = events
        .iter()
        .map(|(key, t, kind)| json!({"key": key, "t": t, "type": kind}))
        .collect();
    json!({"user_id": "u1", "events": events})
}

fn typing_sample() -> Vec<(&'static str, f64, &'static str)> {
    vec![
        ("h", 0.0, "down"),
        ("h", 95.3, "up"),
        ("e", 120.0, "down"),
        ("l", 180.7, "down"),
        ("e", 201.2, "up"),
        ("l", 260.0, "up"),
        ("l", 301.9, "down"),
        ("l", 377.4, "up"),
        ("o", 350.0, "down"),
        ("o", 420.25, "up"),
        ("x", 500.0, "up"),
        ("Shift", 510.0, "down"),
    ]
}

#[test]
fn test_batch_and_online_bit_identical() {
    let sample = canonical(&typing_sample());

    let batch = extract_batch(&sample).unwrap().features;
    let online = extract_online(&sample).unwrap().features;
    assert!(batch.bit_eq(&online));
}

#[test]
fn test_online_aliases_match_canonical() {
    let aliased = json!({
        "key_events": [
            {"key": "a", "time": 100, "type": "down"},
            {"key": "a", "press_time": 150, "type": "up"}
        ]
    });
    let reference = canonical(&[("a", 100.0, "down"), ("a", 150.0, "up")]);

    let online = extract_online(&aliased).unwrap().features;
    let batch = extract_batch(&reference).unwrap().features;
    assert!(online.bit_eq(&batch));
}

#[test]
fn test_mixed_aliases_match_canonical() {
    let aliased_events: Vec<Value> = typing_sample()
        .iter()
        .enumerate()
        .map(|(i, (key, t, kind))| {
            let field = ["t", "time", "press_time"][i % 3];
            json!({"key": key, field: t, "type": kind})
        })
        .collect();
    let aliased = json!({"key_events": aliased_events});

    let online = extract_online(&aliased).unwrap().features;
    let batch = extract_batch(&canonical(&typing_sample())).unwrap().features;
    assert!(online.bit_eq(&batch));
}

#[test]
fn test_input_order_does_not_change_pairing_result() {
    let ordered = vec![
        KeyEvent::down("a", 100.0),
        KeyEvent::up("a", 150.0),
        KeyEvent::down("b", 160.0),
        KeyEvent::up("b", 260.0),
    ];
    // same per-key order, different interleaving
    let shuffled = vec![
        KeyEvent::down("b", 160.0),
        KeyEvent::down("a", 100.0),
        KeyEvent::up("b", 260.0),
        KeyEvent::up("a", 150.0),
    ];

    assert!(compute_features(&ordered).bit_eq(&compute_features(&shuffled)));
}

#[test]
fn test_concrete_scenario() {
    let sample = canonical(&[
        ("a", 100.0, "down"),
        ("a", 150.0, "up"),
        ("b", 160.0, "down"),
        ("b", 260.0, "up"),
    ]);

    let values = extract_online(&sample).unwrap().features.into_array();
    let expected = [80.0, 30.0, 50.0, 110.0, 10.0, 0.0, 10.0, 10.0, 2.0];
    for (got, want) in values.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-9, "got {values:?}");
    }
}

#[test]
fn test_no_completed_press_gives_zero_vector() {
    let sample = canonical(&[("a", 10.0, "up"), ("b", 20.0, "down")]);
    let features = extract_online(&sample).unwrap().features;
    assert_eq!(features.into_array(), [0.0; FEATURE_COUNT]);
}

#[test]
fn test_unmatched_release_contributes_nothing() {
    let base = canonical(&[
        ("a", 0.0, "down"),
        ("a", 40.0, "up"),
        ("b", 70.0, "down"),
        ("b", 130.0, "up"),
    ]);
    let with_stray = canonical(&[
        ("z", 5.0, "up"),
        ("a", 0.0, "down"),
        ("a", 40.0, "up"),
        ("b", 70.0, "down"),
        ("b", 130.0, "up"),
        ("a", 200.0, "up"),
    ]);

    let a = extract_batch(&base).unwrap().features;
    let b = extract_batch(&with_stray).unwrap().features;
    assert!(a.bit_eq(&b));
}

#[test]
fn test_overlapping_typing_gives_negative_flight() {
    let sample = canonical(&[
        ("a", 0.0, "down"),
        ("b", 50.0, "down"),
        ("a", 80.0, "up"),
        ("b", 120.0, "up"),
    ]);

    let flight = extract_batch(&sample).unwrap().features.flight();
    assert_eq!(flight.mean, -30.0);
    assert_eq!(flight.min, -30.0);
}

#[test]
fn test_negative_zero_press_time_matches_zero() {
    let with_zero = canonical(&[
        ("a", 0.0, "down"),
        ("b", 0.0, "down"),
        ("a", 50.0, "up"),
        ("b", 80.0, "up"),
    ]);
    let with_negative_zero = canonical(&[
        ("a", 0.0, "down"),
        ("b", -0.0, "down"),
        ("a", 50.0, "up"),
        ("b", 80.0, "up"),
    ]);

    let a = extract_online(&with_zero).unwrap().features;
    let b = extract_online(&with_negative_zero).unwrap().features;
    assert!(a.bit_eq(&b));
    assert_eq!(b.flight().mean, -50.0);
}

#[test]
fn test_dataset_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = RawLogStore::new(dir.path().join("raw_logs"));

    let mut alice = canonical(&typing_sample());
    alice["user_id"] = json!("alice");
    store.save(&alice).unwrap();
    store
        .save(&json!({"user_id": "bob", "events": "not a list"}))
        .unwrap();

    let mut builder = DatasetBuilder::new();
    builder.add_store(&store).unwrap();
    assert_eq!(builder.rows().len(), 1);
    assert_eq!(builder.report().rejected, 1);

    let output = dir.path().join("out").join("features.csv");
    builder.write_to_path(&output).unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(8), Some("n_keys"));
    assert_eq!(headers.get(9), Some("user_id"));

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get(9), Some("alice"));

    // the stored row equals what a live request for the same sample computes
    let (row, _) = extract_row(&alice, None).unwrap();
    let online = extract_online(&alice).unwrap().features;
    assert!(row.features.bit_eq(&online));
    let n_keys: usize = records[0].get(8).unwrap().parse().unwrap();
    assert_eq!(n_keys, online.n_keys());
}

#[test]
fn test_concurrent_extraction() {
    let sample = canonical(&typing_sample());
    let expected = extract_online(&sample).unwrap().features;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sample = sample.clone();
            std::thread::spawn(move || extract_online(&sample).unwrap().features)
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().bit_eq(&expected));
    }
}
