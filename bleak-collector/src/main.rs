//! bleak-collector entry point: wires the scan engine, observation pipeline
//! and sync server together and serves until stopped.

use anyhow::Context;
use bleak_collector::config;
use bleak_collector::dedup::DedupCache;
use bleak_collector::partition::FleetShape;
use bleak_collector::pipeline::Pipeline;
use bleak_collector::report::ResultBuffer;
use bleak_collector::scan::{ScanEngine, SessionOpener, SimEngine, SimSession};
use bleak_collector::server::{build_router, AppState};
use bleak_collector::state::{new_state, SyncPhase};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let cfg = config::load_config().await;
    info!(node_id = %cfg.node_id, "starting collector");

    let (tx, rx) = mpsc::channel(64);
    let engine: Arc<dyn ScanEngine> = Arc::new(SimEngine::new(
        tx,
        Duration::from_millis(cfg.sim.advertise_interval_ms),
    ));
    let session: Arc<dyn SessionOpener> = Arc::new(SimSession);

    let shape = new_state(FleetShape::default());
    let dedup = new_state(DedupCache::new(
        cfg.dedup.capacity,
        time::Duration::seconds(cfg.dedup.expiration_secs as i64),
    ));
    let buffer = new_state(ResultBuffer::new(cfg.node_id.clone()));
    // Ownership-gated processing stays off until the logger registers us.
    let phase = new_state(SyncPhase::AwaitingRegistration);

    Pipeline {
        shape: shape.clone(),
        dedup,
        buffer: buffer.clone(),
        phase: phase.clone(),
        engine: engine.clone(),
        session,
    }
    .spawn(rx);

    if cfg.sim.enabled {
        engine
            .start()
            .await
            .context("failed to start scan engine")?;
    }

    let app = build_router(AppState {
        shape,
        buffer,
        phase,
        engine,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
