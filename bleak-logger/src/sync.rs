//! The registration/pull exchange with one collector.
//!
//! POSTs `{"si": <fleet index>, "ss": <fleet size>}` to the collector's
//! `/logger` endpoint and receives its buffered survey document. The raw body
//! is kept verbatim for the log sink; only the record count is interpreted
//! here.

use crate::radio::CollectorLink;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct RegistrationRequest {
    pub si: u32,
    pub ss: u32,
}

#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub mac: String,
    pub logs: HashMap<String, serde_json::Value>,
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub mac: String,
    pub record_count: usize,
    /// The response body exactly as received, for the append-only log.
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("collector answered status {0}")]
    Status(u16),
    #[error("malformed sync response: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct SyncClient {
    http: reqwest::Client,
}

impl SyncClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub async fn exchange(
        &self,
        link: &CollectorLink,
        si: u32,
        ss: u32,
    ) -> Result<SyncOutcome, SyncError> {
        let endpoint = format!("{}/logger", link.base_url);
        debug!(%endpoint, si, ss, "starting sync exchange");

        let resp = self
            .http
            .post(&endpoint)
            .json(&RegistrationRequest { si, ss })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        let raw = resp.text().await?;
        let parsed: SyncResponse = serde_json::from_str(&raw)?;
        Ok(SyncOutcome {
            mac: parsed.mac,
            record_count: parsed.logs.len(),
            raw,
        })
    }
}
