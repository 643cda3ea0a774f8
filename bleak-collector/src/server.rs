//! Sync HTTP server: the collector's side of the pull protocol.
//!
//! The logger POSTs a registration `{"si": <index>, "ss": <fleet size>}` to
//! `/logger` and receives the full result buffer in exchange. A malformed
//! payload is answered with 400 and changes nothing. On success scanning is
//! suspended for the duration of the exchange, the fleet shape is re-adopted
//! (idempotent re-registration), the buffer is handed off and restarted, and
//! scanning resumes.

use crate::partition::FleetShape;
use crate::report::ResultBuffer;
use crate::scan::{self, ScanEngine};
use crate::state::{Shared, SyncPhase};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub shape: Shared<FleetShape>,
    pub buffer: Shared<ResultBuffer>,
    pub phase: Shared<SyncPhase>,
    pub engine: Arc<dyn ScanEngine>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub si: u32,
    pub ss: u32,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/logger", post(handle_sync))
        .with_state(state)
}

pub async fn handle_sync(State(app): State<AppState>, body: String) -> Response {
    let req: RegistrationRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!("rejecting malformed registration: {e}");
            return (StatusCode::BAD_REQUEST, "Error").into_response();
        }
    };

    // Stop-the-world: the buffer must not be mutated while it is serialized.
    // An unconfirmed stop aborts the exchange; the logger retries next pass.
    let previous = std::mem::replace(&mut *app.phase.lock(), SyncPhase::PausedForSync);
    if !scan::suspend(app.engine.as_ref()).await {
        warn!("aborting sync exchange, scan engine still running");
        *app.phase.lock() = previous;
        return (StatusCode::SERVICE_UNAVAILABLE, "Error").into_response();
    }

    app.shape.lock().apply_registration(req.si, req.ss);
    let snapshot = app.buffer.lock().take_snapshot();
    info!(
        si = req.si,
        ss = req.ss,
        records = snapshot.logs.len(),
        "sync exchange completed, buffer handed off"
    );

    *app.phase.lock() = SyncPhase::Scanning;
    if let Err(e) = app.engine.start().await {
        warn!("failed to resume scanning after sync: {e}");
    }

    (StatusCode::OK, Json(snapshot)).into_response()
}
