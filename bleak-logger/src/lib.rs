//! bleak-logger - the roaming aggregator of the BLE survey fleet
//!
//! The logger discovers collectors by their broadcast name, visits each one in
//! turn over its own access point, pulls the buffered survey results with a
//! registration/sync exchange, appends every pulled document to an append-only
//! jsonl log, and tracks per-collector liveness from successful exchanges.

pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod display;
pub mod health;
pub mod radio;
pub mod storage;
pub mod sync;
