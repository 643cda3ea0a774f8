//! Station-radio seam: one association at a time, bounded by a timeout.
//!
//! The station radio is a single shared resource; the coordinator associates
//! with exactly one collector's access point at a time, talks to it over HTTP,
//! then disassociates before moving on.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// An established association: where the collector's sync server is reachable.
#[derive(Debug, Clone)]
pub struct CollectorLink {
    pub base_url: String,
}

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("association with {bssid} failed: {reason}")]
    Failed { bssid: String, reason: String },
}

#[async_trait]
pub trait StationRadio: Send + Sync {
    async fn associate(&self, bssid: &str, channel: u32) -> Result<CollectorLink, RadioError>;
    async fn disassociate(&self);
}

/// Simulated station radio: maps BSSIDs to HTTP endpoints.
///
/// Stands in for the platform Wi-Fi stack; a real backend joins the
/// collector's access point and derives the base URL from the gateway
/// address.
pub struct MappedStation {
    targets: HashMap<String, String>,
}

impl MappedStation {
    pub fn new(targets: HashMap<String, String>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl StationRadio for MappedStation {
    async fn associate(&self, bssid: &str, _channel: u32) -> Result<CollectorLink, RadioError> {
        match self.targets.get(bssid) {
            Some(url) => Ok(CollectorLink {
                base_url: url.clone(),
            }),
            None => Err(RadioError::Failed {
                bssid: bssid.to_string(),
                reason: "no such access point".into(),
            }),
        }
    }

    async fn disassociate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mapped_station_resolves_known_bssids_only() {
        let radio = MappedStation::new(HashMap::from([(
            "aa:aa".to_string(),
            "http://127.0.0.1:9000".to_string(),
        )]));
        let link = radio.associate("aa:aa", 1).await.unwrap();
        assert_eq!(link.base_url, "http://127.0.0.1:9000");
        assert!(radio.associate("bb:bb", 1).await.is_err());
    }
}
