//! Buffered observation reports and their wire shape.
//!
//! The result buffer is owned by the collector and handed to the logger by
//! value on a successful pull, then restarted empty. The serialized document
//! is `{ "mac": <node id>, "logs": { "<address>": { ... } } }` with hex-encoded
//! byte fields.

use crate::scan::Observation;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

bitflags! {
    /// GATT characteristic permission flags as carried in the `prop` byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CharProps: u8 {
        const BROADCAST    = 0x01;
        const READ         = 0x02;
        const WRITE_NO_RSP = 0x04;
        const WRITE        = 0x08;
        const NOTIFY       = 0x10;
        const INDICATE     = 0x20;
    }
}

/// One explored characteristic: owning service, characteristic id, the value
/// if it was readable, and the permission flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GattEntry {
    pub svc: String,
    pub chr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<String>,
    pub prop: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    pub name: String,
    pub rssi: i32,
    pub man: String,
    pub connectable: bool,
    pub addr_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Vec<GattEntry>>,
}

impl DeviceReport {
    pub fn from_observation(obs: &Observation) -> Self {
        Self {
            name: to_hex(&obs.name),
            rssi: obs.rssi,
            man: to_hex(&obs.manufacturer_data),
            connectable: obs.connectable,
            addr_type: obs.addr_type,
            tree: None,
        }
    }
}

/// The document handed to the logger on a successful pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub mac: String,
    pub logs: HashMap<String, DeviceReport>,
}

/// Append-only buffer of per-device reports, keyed by device address.
#[derive(Debug)]
pub struct ResultBuffer {
    mac: String,
    logs: HashMap<String, DeviceReport>,
}

impl ResultBuffer {
    pub fn new(mac: String) -> Self {
        Self {
            mac,
            logs: HashMap::new(),
        }
    }

    /// Records a freshly admitted observation.
    pub fn record(&mut self, obs: &Observation) {
        self.logs
            .insert(obs.address_string(), DeviceReport::from_observation(obs));
    }

    /// Attaches the explored attribute tree to an already recorded device.
    pub fn attach_tree(&mut self, address: &str, tree: Vec<GattEntry>) {
        if let Some(report) = self.logs.get_mut(address) {
            report.tree = Some(tree);
        }
    }

    /// Hands the buffered reports out by value and restarts the buffer empty.
    pub fn take_snapshot(&mut self) -> SyncSnapshot {
        SyncSnapshot {
            mac: self.mac.clone(),
            logs: std::mem::take(&mut self.logs),
        }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.logs.contains_key(address)
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Observation {
        Observation {
            address: [0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03],
            addr_type: 0,
            name: b"tag".to_vec(),
            rssi: -51,
            manufacturer_data: vec![0x4C, 0x00],
            connectable: true,
        }
    }

    #[test]
    fn record_and_snapshot_round() {
        let mut buf = ResultBuffer::new("collector-01".into());
        buf.record(&obs());
        assert_eq!(buf.len(), 1);
        assert!(buf.contains("aa:bb:cc:01:02:03"));

        let snap = buf.take_snapshot();
        assert_eq!(snap.mac, "collector-01");
        assert_eq!(snap.logs.len(), 1);
        // Buffer restarts empty, same node id.
        assert!(buf.is_empty());
        assert_eq!(buf.take_snapshot().mac, "collector-01");
    }

    #[test]
    fn report_fields_are_hex_encoded() {
        let report = DeviceReport::from_observation(&obs());
        assert_eq!(report.name, "746167");
        assert_eq!(report.man, "4c00");
        assert_eq!(report.rssi, -51);
        assert!(report.tree.is_none());
    }

    #[test]
    fn tree_attaches_only_to_known_devices() {
        let mut buf = ResultBuffer::new("c".into());
        buf.record(&obs());
        let entry = GattEntry {
            svc: "1800".into(),
            chr: "2a00".into(),
            val: Some("746167".into()),
            prop: (CharProps::READ | CharProps::NOTIFY).bits(),
        };
        buf.attach_tree("aa:bb:cc:01:02:03", vec![entry.clone()]);
        buf.attach_tree("00:00:00:00:00:00", vec![entry]);

        let snap = buf.take_snapshot();
        let report = &snap.logs["aa:bb:cc:01:02:03"];
        let tree = report.tree.as_ref().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].prop, 0x12);
    }

    #[test]
    fn snapshot_serializes_with_wire_field_names() {
        let mut buf = ResultBuffer::new("c".into());
        buf.record(&obs());
        let json = serde_json::to_value(buf.take_snapshot()).unwrap();
        assert_eq!(json["mac"], "c");
        let dev = &json["logs"]["aa:bb:cc:01:02:03"];
        assert_eq!(dev["addr_type"], 0);
        assert_eq!(dev["connectable"], true);
        // No session happened: the tree key is absent, not null.
        assert!(dev.get("tree").is_none());
    }
}
