//! Device identity extraction for dedup and fleet partitioning.
//!
//! A `DeviceKey` is a CRC32 checksum over whichever identity bytes are stable
//! for the advertisement's address kind. It is not cryptographic: two distinct
//! devices sharing a checksum is an accepted trade-off (a duplicated or
//! suppressed report, never a crash).

use crate::scan::Observation;

pub type DeviceKey = u32;

/// BLE address kinds as carried in the advertisement's numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Public addresses do not change; the address itself is a stable key.
    Public,
    /// Random addresses rotate, so the address is unsuitable as an identity.
    Random,
    Other,
}

impl AddressKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => AddressKind::Public,
            1 => AddressKind::Random,
            _ => AddressKind::Other,
        }
    }
}

/// Derives the dedup/ownership key for one observation.
///
/// Public and unclassified addresses hash the 6 raw address bytes. Rotating
/// addresses hash the manufacturer data instead; that payload may itself
/// change or collide across devices, which is a known limitation, not a
/// defect. Absent manufacturer data hashes as the empty input.
pub fn device_key(obs: &Observation) -> DeviceKey {
    match AddressKind::from_code(obs.addr_type) {
        AddressKind::Random => crc32fast::hash(&obs.manufacturer_data),
        AddressKind::Public | AddressKind::Other => crc32fast::hash(&obs.address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(addr_type: u8, address: [u8; 6], man: &[u8]) -> Observation {
        Observation {
            address,
            addr_type,
            name: b"unit".to_vec(),
            rssi: -60,
            manufacturer_data: man.to_vec(),
            connectable: true,
        }
    }

    #[test]
    fn public_address_key_is_deterministic() {
        let a = obs(0, [1, 2, 3, 4, 5, 6], &[0xAA]);
        let b = obs(0, [1, 2, 3, 4, 5, 6], &[0xBB]);
        // Manufacturer data is irrelevant for public addresses.
        assert_eq!(device_key(&a), device_key(&b));
    }

    #[test]
    fn random_address_keys_off_manufacturer_data() {
        let a = obs(1, [1, 2, 3, 4, 5, 6], &[0xAA, 0x01]);
        let b = obs(1, [9, 9, 9, 9, 9, 9], &[0xAA, 0x01]);
        let c = obs(1, [1, 2, 3, 4, 5, 6], &[0xAA, 0x02]);
        // Same payload, different (rotated) address: same key.
        assert_eq!(device_key(&a), device_key(&b));
        // One payload byte changed: different key.
        assert_ne!(device_key(&a), device_key(&c));
    }

    #[test]
    fn random_address_without_manufacturer_data_hashes_empty_input() {
        let a = obs(1, [1, 2, 3, 4, 5, 6], &[]);
        assert_eq!(device_key(&a), crc32fast::hash(&[]));
    }

    #[test]
    fn unclassified_kinds_fall_back_to_address_bytes() {
        let a = obs(3, [1, 2, 3, 4, 5, 6], &[0xAA]);
        assert_eq!(device_key(&a), crc32fast::hash(&[1, 2, 3, 4, 5, 6]));
    }
}
