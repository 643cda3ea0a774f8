//! Observation pipeline: identity -> ownership -> dedup -> record -> session.
//!
//! Runs as a single task consuming the scan engine's channel. Processing is
//! gated off until the first successful registration has established the fleet
//! shape, and while a sync exchange holds the buffer.

use crate::dedup::DedupCache;
use crate::identity::device_key;
use crate::partition::FleetShape;
use crate::report::ResultBuffer;
use crate::scan::{self, Observation, ScanEngine, SessionOpener};
use crate::state::{Shared, SyncPhase};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Pipeline {
    pub shape: Shared<FleetShape>,
    pub dedup: Shared<DedupCache>,
    pub buffer: Shared<ResultBuffer>,
    pub phase: Shared<SyncPhase>,
    pub engine: Arc<dyn ScanEngine>,
    pub session: Arc<dyn SessionOpener>,
}

impl Pipeline {
    /// Handles one observation end to end. Locks are never held across await
    /// points; exclusivity with scanning is enforced by suspend/resume.
    pub async fn handle(&self, obs: Observation) {
        if !self.phase.lock().is_active() {
            return;
        }

        let key = device_key(&obs);
        if !self.shape.lock().owns(key) {
            return;
        }

        if !self.dedup.lock().admit(key, OffsetDateTime::now_utc()) {
            debug!(key, address = %obs.address_string(), "suppressed by dedup window");
            return;
        }

        let address = obs.address_string();
        self.buffer.lock().record(&obs);
        info!(key, %address, rssi = obs.rssi, "recorded owned device");

        // The radio cannot scan and hold a session at the same time. If the
        // engine never confirms the stop, the session is skipped and the
        // report stays tree-less; the device was still recorded.
        if scan::suspend(self.engine.as_ref()).await {
            match self.session.open(&obs).await {
                Ok(tree) => {
                    debug!(%address, entries = tree.len(), "session completed");
                    self.buffer.lock().attach_tree(&address, tree);
                }
                Err(e) => warn!(%address, "session failed: {e}"),
            }
        } else {
            warn!(%address, "skipping session, scan engine still running");
        }
        if let Err(e) = self.engine.start().await {
            warn!("failed to resume scanning: {e}");
        }
    }

    pub fn spawn(self, mut rx: mpsc::Receiver<Observation>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(obs) = rx.recv().await {
                self.handle(obs).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::GattEntry;
    use crate::scan::{ScanError, SessionError};
    use crate::state::new_state;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use time::Duration;

    struct IdleEngine {
        scanning: AtomicBool,
    }

    impl IdleEngine {
        fn new() -> Self {
            Self {
                scanning: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl ScanEngine for IdleEngine {
        async fn start(&self) -> Result<(), ScanError> {
            self.scanning.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn request_stop(&self) {
            self.scanning.store(false, Ordering::SeqCst);
        }
        fn is_scanning(&self) -> bool {
            self.scanning.load(Ordering::SeqCst)
        }
    }

    struct FixedSession;

    #[async_trait]
    impl SessionOpener for FixedSession {
        async fn open(&self, _obs: &Observation) -> Result<Vec<GattEntry>, SessionError> {
            Ok(vec![GattEntry {
                svc: "180f".into(),
                chr: "2a19".into(),
                val: Some("64".into()),
                prop: 0x02,
            }])
        }
    }

    fn pipeline(shape: FleetShape, phase: SyncPhase) -> Pipeline {
        Pipeline {
            shape: new_state(shape),
            dedup: new_state(DedupCache::new(100, Duration::seconds(300))),
            buffer: new_state(ResultBuffer::new("node".into())),
            phase: new_state(phase),
            engine: Arc::new(IdleEngine::new()),
            session: Arc::new(FixedSession),
        }
    }

    fn obs(last_byte: u8) -> Observation {
        Observation {
            address: [0, 0, 0, 0, 0, last_byte],
            addr_type: 0,
            name: b"dev".to_vec(),
            rssi: -55,
            manufacturer_data: vec![],
            connectable: true,
        }
    }

    #[tokio::test]
    async fn nothing_is_processed_before_first_registration() {
        let p = pipeline(FleetShape::default(), SyncPhase::AwaitingRegistration);
        p.handle(obs(1)).await;
        assert!(p.buffer.lock().is_empty());
        assert!(p.dedup.lock().is_empty());
    }

    #[tokio::test]
    async fn owned_device_is_recorded_once_with_tree() {
        let p = pipeline(FleetShape::default(), SyncPhase::Scanning);
        p.handle(obs(1)).await;
        p.handle(obs(1)).await;

        let mut buf = p.buffer.lock();
        assert_eq!(buf.len(), 1);
        let snap = buf.take_snapshot();
        let report = &snap.logs["00:00:00:00:00:01"];
        assert!(report.tree.is_some());
        // Scanning resumed after the session.
        assert!(p.engine.is_scanning());
    }

    #[tokio::test]
    async fn unowned_devices_are_ignored_entirely() {
        let o = obs(7);
        let key = device_key(&o);
        // A shape that cannot own this key.
        let shape = FleetShape {
            self_index: (key % 2 + 1) % 2,
            node_count: 2,
        };
        assert!(!shape.owns(key));

        let p = pipeline(shape, SyncPhase::Scanning);
        p.handle(o).await;
        assert!(p.buffer.lock().is_empty());
        // Not even the dedup cache is touched for foreign devices.
        assert!(p.dedup.lock().is_empty());
    }

    struct StuckEngine;

    #[async_trait]
    impl ScanEngine for StuckEngine {
        async fn start(&self) -> Result<(), ScanError> {
            Ok(())
        }
        fn request_stop(&self) {}
        fn is_scanning(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn session_is_skipped_when_the_stop_is_unconfirmed() {
        let mut p = pipeline(FleetShape::default(), SyncPhase::Scanning);
        p.engine = Arc::new(StuckEngine);
        p.handle(obs(1)).await;

        // Recorded, but no session ran against a still-scanning radio.
        let snap = p.buffer.lock().take_snapshot();
        assert_eq!(snap.logs.len(), 1);
        assert!(snap.logs["00:00:00:00:00:01"].tree.is_none());
    }

    #[tokio::test]
    async fn two_node_fleet_buffers_are_disjoint() {
        let a = pipeline(
            FleetShape {
                self_index: 0,
                node_count: 2,
            },
            SyncPhase::Scanning,
        );
        let b = pipeline(
            FleetShape {
                self_index: 1,
                node_count: 2,
            },
            SyncPhase::Scanning,
        );

        for i in 0..16 {
            let o = obs(i);
            a.handle(o.clone()).await;
            b.handle(o).await;
        }

        let snap_a = a.buffer.lock().take_snapshot();
        let snap_b = b.buffer.lock().take_snapshot();
        assert!(!snap_a.logs.is_empty());
        assert!(!snap_b.logs.is_empty());
        for address in snap_a.logs.keys() {
            assert!(!snap_b.logs.contains_key(address));
        }
        assert_eq!(snap_a.logs.len() + snap_b.logs.len(), 16);
    }
}
