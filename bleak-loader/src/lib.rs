//! bleak-loader - offline catalog builder for the BLE survey fleet
//!
//! Ingests the logger's append-only `log.jsonl` into a sqlite database:
//! every sync document is flattened into per-device and per-characteristic
//! rows, optionally enriched with manufacturer names (OUI prefix lookup) and
//! human-readable characteristic names, then deduplicated into a final
//! `records` table for analysis.

pub mod catalog;
pub mod jlog;
pub mod lookup;
