//! Flattening of the logger's jsonl documents into catalog rows.
//!
//! Each line is one sync document, `{"mac": <collector>, "logs": {<device
//! address>: {...}}}`. Every device yields one advertisement row; if the
//! device carries an explored attribute tree, each branch yields one more row
//! repeating the advertisement columns. Hex fields are decoded to bytes; a
//! field that fails to decode is left empty rather than dropping the row.

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct LogLine {
    #[allow(dead_code)]
    mac: String,
    logs: HashMap<String, DeviceLog>,
}

#[derive(Debug, Deserialize)]
struct DeviceLog {
    name: String,
    #[allow(dead_code)]
    rssi: i64,
    man: String,
    #[allow(dead_code)]
    connectable: bool,
    #[allow(dead_code)]
    addr_type: i64,
    #[serde(default)]
    tree: Vec<TreeBranch>,
}

#[derive(Debug, Deserialize)]
struct TreeBranch {
    svc: String,
    chr: String,
    #[serde(default)]
    val: String,
    prop: i64,
}

/// One row of the `logs` staging table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub mac: String,
    pub name: String,
    pub man: Vec<u8>,
    pub svc: String,
    pub chr: String,
    pub props: i64,
    pub val: Option<Vec<u8>>,
}

/// Everything recovered from one jsonl file.
#[derive(Debug)]
pub struct LogIngest {
    pub rows: Vec<LogRow>,
    pub skipped_lines: usize,
}

static DEVICE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").unwrap());

fn is_device_address(s: &str) -> bool {
    DEVICE_ADDRESS.is_match(s)
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Parses one document line into flat rows. Entries whose key is not a
/// device address are dropped; they cannot be joined against the OUI table.
pub fn parse_line(line: &str) -> Result<Vec<LogRow>, serde_json::Error> {
    let doc: LogLine = serde_json::from_str(line)?;
    let mut rows = Vec::new();

    for (address, device) in &doc.logs {
        if !is_device_address(address) {
            continue;
        }
        let name = from_hex(&device.name)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        let man = from_hex(&device.man).unwrap_or_default();

        rows.push(LogRow {
            mac: address.clone(),
            name: name.clone(),
            man: man.clone(),
            svc: String::new(),
            chr: String::new(),
            props: 0,
            val: None,
        });

        for branch in &device.tree {
            rows.push(LogRow {
                mac: address.clone(),
                name: name.clone(),
                man: man.clone(),
                svc: branch.svc.clone(),
                chr: branch.chr.clone(),
                props: branch.prop,
                val: from_hex(&branch.val),
            });
        }
    }
    Ok(rows)
}

/// Reads a whole jsonl file. Malformed lines are counted and skipped, never
/// fatal; an unreadable file is.
pub fn read_log<P: AsRef<Path>>(path: P) -> anyhow::Result<LogIngest> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    let mut skipped_lines = 0;
    for line in BufReader::new(file).lines() {
        let line = line?;
        match parse_line(&line) {
            Ok(mut parsed) => rows.append(&mut parsed),
            Err(e) => {
                warn!("skipping malformed log line: {e}");
                skipped_lines += 1;
            }
        }
    }
    Ok(LogIngest {
        rows,
        skipped_lines,
    })
}
