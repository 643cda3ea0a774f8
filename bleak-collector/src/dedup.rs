//! Bounded, time-expiring dedup cache.
//!
//! Answers "have we handled this device recently?". A key is admitted exactly
//! once per expiry window; while its entry is live, further observations of
//! the same key are suppressed. The table has a fixed number of slots; when it
//! is full, the entry with the earliest expiry is overwritten.

use crate::identity::DeviceKey;
use time::{Duration, OffsetDateTime};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct DedupEntry {
    key: DeviceKey,
    expires_at: OffsetDateTime,
}

pub struct DedupCache {
    slots: Vec<Option<DedupEntry>>,
    expiration: Duration,
}

impl DedupCache {
    pub fn new(capacity: usize, expiration: Duration) -> Self {
        Self {
            slots: vec![None; capacity],
            expiration,
        }
    }

    /// Returns true exactly once per key per expiry window.
    ///
    /// Runs the expiry sweep first, then looks the key up, then inserts it.
    /// Entries are never refreshed on lookup; replacement is strict
    /// oldest-by-expiry with the lowest slot index winning ties.
    pub fn admit(&mut self, key: DeviceKey, now: OffsetDateTime) -> bool {
        self.sweep(now);

        if self.slots.iter().flatten().any(|e| e.key == key) {
            return false;
        }

        let entry = DedupEntry {
            key,
            expires_at: now + self.expiration,
        };

        // An empty slot always wins over evicting the oldest live entry.
        if let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(entry);
            return true;
        }

        let mut oldest: Option<(usize, OffsetDateTime)> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(e) = slot {
                match oldest {
                    Some((_, expiry)) if e.expires_at >= expiry => {}
                    _ => oldest = Some((i, e.expires_at)),
                }
            }
        }
        if let Some((i, _)) = oldest {
            self.slots[i] = Some(entry);
        }
        true
    }

    /// Number of live entries. Mostly useful for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&mut self, now: OffsetDateTime) {
        for slot in &mut self.slots {
            if let Some(e) = slot {
                if e.expires_at <= now {
                    debug!(key = e.key, "dedup entry expired");
                    *slot = None;
                }
            }
        }
    }
}
