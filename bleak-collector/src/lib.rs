//! bleak-collector - one node of the BLE advertisement survey fleet
//!
//! A collector continuously scans for BLE advertisements, keeps the devices
//! assigned to it by the fleet partition, explores each owned device at most
//! once per dedup window, and buffers the results until the roaming logger
//! pulls them over HTTP.

pub mod config;
pub mod dedup;
pub mod identity;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod server;
pub mod state;
