//! Fleet coordination loop.
//!
//! Each pass: sweep for new collectors, then visit every known collector in
//! discovery order. Healthy collectors are skipped; for the rest the pass
//! associates with their access point (bounded by the connect timeout), runs
//! the sync exchange with the collector's current fleet index and the current
//! fleet size, appends the pulled document to the log sink and refreshes the
//! health record. Any failure leaves the record untouched; the next pass is
//! the retry.

use crate::config::LoggerConfig;
use crate::discovery::{self, NetworkSweep};
use crate::display::StatusBoard;
use crate::health::HealthRegistry;
use crate::radio::StationRadio;
use crate::storage::LogSink;
use crate::sync::SyncClient;
use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct FleetCoordinator {
    cfg: LoggerConfig,
    registry: HealthRegistry,
    sweeper: Arc<dyn NetworkSweep>,
    radio: Arc<dyn StationRadio>,
    client: SyncClient,
    sink: Arc<dyn LogSink>,
    board: StatusBoard,
}

impl FleetCoordinator {
    pub fn new(
        cfg: LoggerConfig,
        sweeper: Arc<dyn NetworkSweep>,
        radio: Arc<dyn StationRadio>,
        sink: Arc<dyn LogSink>,
    ) -> anyhow::Result<Self> {
        let client = SyncClient::new(Duration::from_secs(cfg.connect_timeout_secs))
            .context("failed to build sync client")?;
        let registry =
            HealthRegistry::new(ChronoDuration::seconds(cfg.health_expiration_secs as i64));
        Ok(Self {
            cfg,
            registry,
            sweeper,
            radio,
            client,
            sink,
            board: StatusBoard,
        })
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    /// One full pass over the fleet. Collaborator failures are logged and
    /// skipped, never fatal.
    pub async fn run_pass(&mut self) {
        match discovery::sweep(
            self.sweeper.as_ref(),
            &self.cfg.service_name,
            &mut self.registry,
        )
        .await
        {
            Ok(added) if added > 0 => info!(added, "discovery sweep found new collectors"),
            Ok(_) => {}
            Err(e) => warn!("discovery sweep unavailable this pass: {e}"),
        }

        for index in 0..self.registry.len() {
            if self.registry.healthy(index, Utc::now()) {
                continue;
            }
            self.visit(index).await;
            self.board.render(&self.registry, Utc::now());
        }
    }

    /// Visits one unhealthy collector: associate, exchange, record.
    async fn visit(&mut self, index: usize) {
        let (bssid, channel) = {
            let rec = &self.registry.records()[index];
            (rec.bssid.clone(), rec.channel)
        };
        info!(index, %bssid, "targeting collector");

        let connect_timeout = Duration::from_secs(self.cfg.connect_timeout_secs);
        let link = match tokio::time::timeout(
            connect_timeout,
            self.radio.associate(&bssid, channel),
        )
        .await
        {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => {
                warn!(%bssid, "association failed: {e}");
                return;
            }
            Err(_) => {
                warn!(%bssid, "association timed out after {connect_timeout:?}");
                return;
            }
        };

        // The collector's fleet index is its discovery position; both values
        // are re-sent every sync so shape changes propagate.
        let ss = self.registry.len() as u32;
        match self.client.exchange(&link, index as u32, ss).await {
            Ok(outcome) => {
                if let Err(e) = self.sink.append(&outcome.raw).await {
                    warn!(%bssid, "failed to append sync document: {e}");
                }
                self.registry
                    .mark_success(index, outcome.record_count as u64, Utc::now());
                info!(
                    index,
                    mac = %outcome.mac,
                    records = outcome.record_count,
                    "sync exchange succeeded"
                );
            }
            Err(e) => warn!(%bssid, "sync exchange failed: {e}"),
        }

        self.radio.disassociate().await;
    }

    /// Runs passes forever with the configured cadence.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let pass_interval = Duration::from_secs(self.cfg.pass_interval_secs);
        loop {
            self.run_pass().await;
            self.board.render(&self.registry, Utc::now());
            tokio::time::sleep(pass_interval).await;
        }
    }
}
