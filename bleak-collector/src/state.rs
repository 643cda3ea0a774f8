use parking_lot::Mutex;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Lifecycle of a collector with respect to the sync protocol.
///
/// The observation pipeline only runs in `Scanning`. Before the first
/// successful registration the fleet shape is unknown, so ownership decisions
/// would be unsafe; during a sync the result buffer is being serialized and
/// must not be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    AwaitingRegistration,
    Scanning,
    PausedForSync,
}

impl SyncPhase {
    pub fn is_active(self) -> bool {
        self == SyncPhase::Scanning
    }
}
