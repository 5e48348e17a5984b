//! Demonstration of keystroke feature extraction.
//!
//! This example shows how to:
//! 1. Save captured samples to a raw log store
//! 2. Build a labeled training dataset from the store
//! 3. Compute the feature vector of a live sample with aliased field names
//!
//! Run with: cargo run --example extract_demo

use keystroke_id::{
    core::FEATURE_NAMES,
    pipeline::{extract_online, DatasetBuilder},
    storage::RawLogStore,
};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    println!("keystroke-id - Extraction Demo");
    println!("==============================");
    println!();

    let dir = std::env::temp_dir().join("keystroke-id-demo");
    let store = RawLogStore::new(dir.join("raw_logs"));

    // Two users typing the same word at different speeds
    for (user, scale) in [("alice", 1.0), ("bob", 2.5)] {
        let events: Vec<_> = "hello"
            .chars()
            .enumerate()
            .flat_map(|(i, c)| {
                let down = i as f64 * 150.0 * scale;
                let up = down + 80.0 * scale;
                [
                    json!({"key": c.to_string(), "t": down, "type": "down"}),
                    json!({"key": c.to_string(), "t": up, "type": "up"}),
                ]
            })
            .collect();

        let path = store.save(&json!({"user_id": user, "events": events}))?;
        println!("Saved sample for {user} to {path:?}");
    }
    println!();

    let mut builder = DatasetBuilder::new();
    builder.add_store(&store)?;
    let dataset = dir.join("features.csv");
    builder.write_to_path(&dataset)?;
    println!(
        "Built dataset with {} rows at {:?}",
        builder.rows().len(),
        dataset
    );
    println!();

    // A live request from an older client using different field names
    let live = json!({
        "key_events": [
            {"key": "h", "time": 0, "type": "down"},
            {"key": "h", "press_time": 90, "type": "up"},
            {"key": "i", "time": 140, "type": "down"},
            {"key": "i", "press_time": 210, "type": "up"}
        ]
    });

    let extraction = extract_online(&live)?;
    println!("Live sample features:");
    for (name, value) in FEATURE_NAMES.iter().zip(extraction.features.as_array()) {
        println!("  {name:<12} {value:.2}");
    }

    Ok(())
}
