//! bleak-logger entry point: builds the coordinator from config and runs
//! passes until stopped.

use bleak_logger::config;
use bleak_logger::coordinator::FleetCoordinator;
use bleak_logger::discovery::{ApCandidate, StaticSweep};
use bleak_logger::radio::MappedStation;
use bleak_logger::storage::JsonlSink;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let cfg = config::load_config().await;
    info!(service = %cfg.service_name, "starting logger");

    // Simulated deployment: the configured access points both answer the
    // discovery sweep and resolve to HTTP endpoints. A hardware build swaps
    // these two for the platform Wi-Fi scan and station backends.
    let sweeper = Arc::new(StaticSweep {
        aps: cfg
            .sim
            .aps
            .iter()
            .map(|ap| ApCandidate {
                ssid: cfg.service_name.clone(),
                bssid: ap.bssid.clone(),
                channel: ap.channel,
            })
            .collect(),
    });
    let radio = Arc::new(MappedStation::new(
        cfg.sim
            .aps
            .iter()
            .map(|ap| (ap.bssid.clone(), ap.base_url.clone()))
            .collect::<HashMap<_, _>>(),
    ));
    let sink = Arc::new(JsonlSink::new(cfg.log_path.clone()));

    FleetCoordinator::new(cfg, sweeper, radio, sink)?
        .run()
        .await
}
