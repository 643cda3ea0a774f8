/*!
Test helpers for the bleak fleet

Logging setup, jsonl read-back for asserting on the logger's append-only
sink, and builders for protocol payloads shaped like real collector output.
*/

use anyhow::Result;
use serde_json::{json, Value};
use std::path::Path;

/// Initializes env_logger once per test binary; safe to call repeatedly.
pub fn init_test_logging() {
    env_logger::try_init().ok();
}

/// Creates a scratch directory that is removed on drop.
pub fn scratch_dir() -> Result<tempfile::TempDir> {
    Ok(tempfile::tempdir()?)
}

/// Reads a jsonl file back as parsed documents, one per line.
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

/// Builds a device report shaped like a collector's buffer entry.
pub fn device_report(name_hex: &str, rssi: i64, connectable: bool) -> Value {
    json!({
        "name": name_hex,
        "rssi": rssi,
        "man": "4c00",
        "connectable": connectable,
        "addr_type": 0,
    })
}

/// Builds a full sync response document.
pub fn sync_response(mac: &str, devices: &[(&str, Value)]) -> Value {
    let mut logs = serde_json::Map::new();
    for (address, report) in devices {
        logs.insert(address.to_string(), report.clone());
    }
    json!({ "mac": mac, "logs": logs })
}
