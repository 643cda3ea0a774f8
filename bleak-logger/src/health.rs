//! Per-collector liveness tracking.
//!
//! A collector is known forever once discovered; records are never evicted,
//! a silent collector simply shows as unhealthy until its next successful
//! sync. Records are kept in discovery order, and that order doubles as the
//! fleet index handed out during registration.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CollectorRecord {
    pub bssid: String,
    pub channel: u32,
    pub event_count: u64,
    pub last_success: Option<DateTime<Utc>>,
}

pub struct HealthRegistry {
    records: Vec<CollectorRecord>,
    expiration: Duration,
}

impl HealthRegistry {
    pub fn new(expiration: Duration) -> Self {
        Self {
            records: Vec::new(),
            expiration,
        }
    }

    pub fn contains(&self, bssid: &str) -> bool {
        self.records.iter().any(|r| r.bssid == bssid)
    }

    /// Registers a freshly discovered collector. It starts unhealthy: never
    /// synced, no events.
    pub fn add(&mut self, bssid: String, channel: u32) {
        self.records.push(CollectorRecord {
            bssid,
            channel,
            event_count: 0,
            last_success: None,
        });
    }

    pub fn records(&self) -> &[CollectorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Marks a successful sync exchange: bump the event counter by the number
    /// of records received and refresh the liveness timestamp.
    pub fn mark_success(&mut self, index: usize, events: u64, now: DateTime<Utc>) {
        if let Some(rec) = self.records.get_mut(index) {
            rec.event_count += events;
            rec.last_success = Some(now);
        }
    }

    /// `last_success + expiration > now`; a never-synced record is unhealthy.
    pub fn healthy(&self, index: usize, now: DateTime<Utc>) -> bool {
        self.records
            .get(index)
            .and_then(|r| r.last_success)
            .map(|t| t + self.expiration > now)
            .unwrap_or(false)
    }

    pub fn healthy_count(&self, now: DateTime<Utc>) -> usize {
        (0..self.records.len())
            .filter(|&i| self.healthy(i, now))
            .count()
    }

    pub fn total_events(&self) -> u64 {
        self.records.iter().map(|r| r.event_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HealthRegistry {
        HealthRegistry::new(Duration::seconds(60))
    }

    #[test]
    fn fresh_record_is_unhealthy_until_first_sync() {
        let mut reg = registry();
        reg.add("aa:aa".into(), 1);
        let now = Utc::now();
        assert!(!reg.healthy(0, now));

        reg.mark_success(0, 3, now);
        assert!(reg.healthy(0, now));
        assert_eq!(reg.total_events(), 3);
    }

    #[test]
    fn health_expires_after_the_window() {
        let mut reg = registry();
        reg.add("aa:aa".into(), 1);
        let t0 = Utc::now();
        reg.mark_success(0, 1, t0);

        assert!(reg.healthy(0, t0 + Duration::seconds(59)));
        assert!(!reg.healthy(0, t0 + Duration::seconds(60)));
        assert!(!reg.healthy(0, t0 + Duration::seconds(120)));
    }

    #[test]
    fn records_accumulate_and_are_never_evicted() {
        let mut reg = registry();
        reg.add("aa:aa".into(), 1);
        reg.add("bb:bb".into(), 6);
        reg.mark_success(0, 2, Utc::now());
        reg.mark_success(0, 5, Utc::now());

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.records()[0].event_count, 7);
        assert_eq!(reg.healthy_count(Utc::now()), 1);
        assert_eq!(reg.total_events(), 7);
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut reg = registry();
        reg.mark_success(4, 1, Utc::now());
        assert!(!reg.healthy(4, Utc::now()));
        assert_eq!(reg.total_events(), 0);
    }
}
