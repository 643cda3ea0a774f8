//! Static hash-partition of device keys across the fleet.
//!
//! Every device key is owned by exactly one collector index, so the fleet as a
//! whole reports each device once. This is a plain modulo partition, not a
//! consistent-hash ring: a fleet-size change reshuffles ownership of nearly
//! all keys, which only risks a briefly double-counted device.

use crate::identity::DeviceKey;
use serde::{Deserialize, Serialize};

/// This collector's position in the fleet, as assigned by the logger.
///
/// Updated only by a successful registration. The default of index 0 in a
/// fleet of 1 is the safe single-node shape under which every key is owned
/// locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetShape {
    pub self_index: u32,
    pub node_count: u32,
}

impl Default for FleetShape {
    fn default() -> Self {
        Self {
            self_index: 0,
            node_count: 1,
        }
    }
}

impl FleetShape {
    /// True when this collector is responsible for `key`.
    ///
    /// A stored node_count of zero is treated as a fleet of one; the modulus
    /// is never zero.
    pub fn owns(&self, key: DeviceKey) -> bool {
        let count = self.node_count.max(1);
        key % count == self.self_index
    }

    /// Applies a registration payload from the logger.
    ///
    /// The index is always adopted. A node_count of zero means the logger has
    /// not finished counting the fleet yet, so the previous value is kept.
    pub fn apply_registration(&mut self, self_index: u32, node_count: u32) {
        self.self_index = self_index;
        if node_count != 0 {
            self.node_count = node_count;
        }
    }
}
