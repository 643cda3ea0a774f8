//! Scan-engine and device-session collaborator seams.
//!
//! The radio stack is external to the coordination core: it delivers
//! observations over a channel and exposes suspend/resume control. The one
//! hard rule is exclusivity, the radio cannot scan while a device session or
//! a sync serialization is in progress, so `suspend` stops the scan and waits
//! until the engine confirms it has stopped.

use crate::report::{to_hex, CharProps, GattEntry};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One received advertisement, as delivered by the scan engine.
#[derive(Debug, Clone)]
pub struct Observation {
    pub address: [u8; 6],
    pub addr_type: u8,
    pub name: Vec<u8>,
    pub rssi: i32,
    pub manufacturer_data: Vec<u8>,
    pub connectable: bool,
}

impl Observation {
    pub fn address_string(&self) -> String {
        self.address
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan engine unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection to device failed: {0}")]
    Connect(String),
    #[error("attribute walk failed: {0}")]
    Walk(String),
}

#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Starts (or resumes) continuous scanning.
    async fn start(&self) -> Result<(), ScanError>;
    /// Asks the engine to stop; completion is observed via `is_scanning`.
    fn request_stop(&self);
    fn is_scanning(&self) -> bool;
}

/// Opens a short-lived session against an observed device and walks its
/// attribute tree. Must only be called while scanning is suspended.
#[async_trait]
pub trait SessionOpener: Send + Sync {
    async fn open(&self, obs: &Observation) -> Result<Vec<GattEntry>, SessionError>;
}

/// How long `suspend` is willing to wait for the engine to confirm the stop.
const SUSPEND_CONFIRM_TIMEOUT: Duration = Duration::from_secs(2);

/// Stops scanning and waits, bounded, until the engine confirms it stopped.
///
/// Returns whether the stop was confirmed. Exclusive work (a device session,
/// a sync serialization) must not start on an unconfirmed suspension.
pub async fn suspend(engine: &dyn ScanEngine) -> bool {
    if !engine.is_scanning() {
        return true;
    }
    engine.request_stop();
    let deadline = tokio::time::Instant::now() + SUSPEND_CONFIRM_TIMEOUT;
    while engine.is_scanning() {
        if tokio::time::Instant::now() >= deadline {
            warn!("scan engine did not confirm stop in time");
            return false;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    debug!("scan engine suspended");
    true
}

/// Simulated scan engine: cycles through a small set of synthetic devices.
///
/// Stands in for the platform radio so a collector can run end to end without
/// hardware; a real backend implements the same trait.
pub struct SimEngine {
    tx: mpsc::Sender<Observation>,
    interval: Duration,
    scanning: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    cursor: Arc<AtomicU64>,
}

impl SimEngine {
    pub fn new(tx: mpsc::Sender<Observation>, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            scanning: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            cursor: Arc::new(AtomicU64::new(0)),
        }
    }

    fn synthetic(step: u64) -> Observation {
        let device = step % 4;
        Observation {
            address: [0xde, 0xad, 0x00, 0x00, 0x00, device as u8],
            addr_type: if device == 3 { 1 } else { 0 },
            name: format!("sim-{device}").into_bytes(),
            // Drift the signal a little so consecutive reports differ.
            rssi: -40 - ((step / 4) % 30) as i32,
            manufacturer_data: vec![0x4c, 0x00, device as u8],
            connectable: device != 2,
        }
    }
}

#[async_trait]
impl ScanEngine for SimEngine {
    async fn start(&self) -> Result<(), ScanError> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.stop_requested.store(false, Ordering::SeqCst);

        let tx = self.tx.clone();
        let interval = self.interval;
        let scanning = self.scanning.clone();
        let stop_requested = self.stop_requested.clone();
        let cursor = self.cursor.clone();
        tokio::spawn(async move {
            loop {
                if stop_requested.load(Ordering::SeqCst) {
                    break;
                }
                let step = cursor.fetch_add(1, Ordering::SeqCst);
                if tx.send(Self::synthetic(step)).await.is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
            scanning.store(false, Ordering::SeqCst);
        });
        Ok(())
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }
}

/// Simulated session opener: returns a minimal generic-access tree.
#[derive(Default)]
pub struct SimSession;

#[async_trait]
impl SessionOpener for SimSession {
    async fn open(&self, obs: &Observation) -> Result<Vec<GattEntry>, SessionError> {
        if !obs.connectable {
            return Err(SessionError::Connect("device not connectable".into()));
        }
        Ok(vec![GattEntry {
            svc: "1800".into(),
            chr: "2a00".into(),
            val: Some(to_hex(&obs.name)),
            prop: CharProps::READ.bits(),
        }])
    }
}
