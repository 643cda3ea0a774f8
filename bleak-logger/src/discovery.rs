//! Collector discovery via access-point sweeps.
//!
//! Collectors announce themselves as access points under a fixed broadcast
//! name. Every sweep adds the candidates we have not seen before to the health
//! registry; membership is append-only.

use crate::health::HealthRegistry;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ApCandidate {
    pub ssid: String,
    pub bssid: String,
    pub channel: u32,
}

/// Radio-network scan capability, supplied by the platform.
#[async_trait]
pub trait NetworkSweep: Send + Sync {
    async fn scan(&self) -> anyhow::Result<Vec<ApCandidate>>;
}

/// Runs one sweep and registers every new collector. Returns how many were
/// added.
pub async fn sweep(
    sweeper: &dyn NetworkSweep,
    service_name: &str,
    registry: &mut HealthRegistry,
) -> anyhow::Result<usize> {
    let mut added = 0;
    for ap in sweeper.scan().await? {
        if ap.ssid != service_name || registry.contains(&ap.bssid) {
            continue;
        }
        info!(bssid = %ap.bssid, channel = ap.channel, "discovered collector");
        registry.add(ap.bssid, ap.channel);
        added += 1;
    }
    Ok(added)
}

/// Fixed candidate list, used by the simulated deployment and in tests.
pub struct StaticSweep {
    pub aps: Vec<ApCandidate>,
}

#[async_trait]
impl NetworkSweep for StaticSweep {
    async fn scan(&self) -> anyhow::Result<Vec<ApCandidate>> {
        Ok(self.aps.clone())
    }
}
