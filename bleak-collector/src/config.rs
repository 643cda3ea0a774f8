use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Identifier reported as `mac` in every sync response.
    pub node_id: String,
    pub http_port: u16,
    pub dedup: DedupConfig,
    pub sim: SimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub capacity: usize,
    pub expiration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Run the simulated scan engine instead of a hardware radio backend.
    pub enabled: bool,
    pub advertise_interval_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            node_id: "bleak-collector".into(),
            http_port: 8080,
            dedup: DedupConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            expiration_secs: 300,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            advertise_interval_ms: 250,
        }
    }
}

pub async fn load_config() -> CollectorConfig {
    let path = std::env::var("BLEAK_COLLECTOR_CONFIG").unwrap_or_else(|_| "collector.toml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return CollectorConfig::default();
        }
        toml::from_str(&txt).unwrap_or_else(|e| {
            warn!("invalid config {path}: {e}");
            CollectorConfig::default()
        })
    } else {
        warn!("no {path}, using default config");
        CollectorConfig::default()
    }
}
