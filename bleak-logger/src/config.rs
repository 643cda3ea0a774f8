use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Broadcast name collectors announce themselves under.
    pub service_name: String,
    pub health_expiration_secs: u64,
    pub connect_timeout_secs: u64,
    pub pass_interval_secs: u64,
    pub log_path: PathBuf,
    pub sim: SimConfig,
}

/// Simulated deployment: fixed access points mapped to HTTP endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub aps: Vec<SimAp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimAp {
    pub bssid: String,
    pub channel: u32,
    pub base_url: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            service_name: "BLEAKEST".into(),
            health_expiration_secs: 60,
            connect_timeout_secs: 10,
            pass_interval_secs: 5,
            log_path: "log.jsonl".into(),
            sim: SimConfig::default(),
        }
    }
}

pub async fn load_config() -> LoggerConfig {
    let path = std::env::var("BLEAK_LOGGER_CONFIG").unwrap_or_else(|_| "logger.toml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return LoggerConfig::default();
        }
        toml::from_str(&txt).unwrap_or_else(|e| {
            warn!("invalid config {path}: {e}");
            LoggerConfig::default()
        })
    } else {
        warn!("no {path}, using default config");
        LoggerConfig::default()
    }
}
