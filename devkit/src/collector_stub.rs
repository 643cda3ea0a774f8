/*!
Stub collector HTTP server

Speaks the collector side of the sync protocol so logger code can be tested
in-process: a registration POST on `/logger` is recorded, malformed bodies
get a 400, and a well-formed one is answered with the canned result buffer,
which is then cleared exactly like a real collector's hand-off.
*/

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone)]
struct StubState {
    mac: String,
    logs: Arc<Mutex<Map<String, Value>>>,
    registrations: Arc<Mutex<Vec<(u64, u64)>>>,
}

/// Handle to a running stub collector.
pub struct StubCollector {
    addr: SocketAddr,
    state: StubState,
}

impl StubCollector {
    /// Binds an ephemeral local port and serves the stub in the background.
    pub async fn spawn(mac: &str) -> Result<Self> {
        let state = StubState {
            mac: mac.to_string(),
            logs: Arc::new(Mutex::new(Map::new())),
            registrations: Arc::new(Mutex::new(Vec::new())),
        };

        let router = Router::new()
            .route("/logger", post(handle_sync))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                log::error!("[STUB] server exited: {e}");
            }
        });

        log::info!("[STUB] collector {mac} listening on {addr}");
        Ok(Self { addr, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Seeds one canned device report into the stub's buffer.
    pub fn push_device(&self, address: &str, report: Value) {
        self.state
            .logs
            .lock()
            .unwrap()
            .insert(address.to_string(), report);
    }

    /// Every `(si, ss)` registration received so far, in order.
    pub fn registrations(&self) -> Vec<(u64, u64)> {
        self.state.registrations.lock().unwrap().clone()
    }

    /// Number of reports still buffered (zero after a successful pull).
    pub fn buffered(&self) -> usize {
        self.state.logs.lock().unwrap().len()
    }
}

async fn handle_sync(State(state): State<StubState>, body: String) -> Response {
    let parsed: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) => return (StatusCode::BAD_REQUEST, "Error").into_response(),
    };
    let (Some(si), Some(ss)) = (parsed["si"].as_u64(), parsed["ss"].as_u64()) else {
        return (StatusCode::BAD_REQUEST, "Error").into_response();
    };

    state.registrations.lock().unwrap().push((si, ss));
    let logs = std::mem::take(&mut *state.logs.lock().unwrap());
    log::info!("[STUB] {} handed off {} reports", state.mac, logs.len());
    (
        StatusCode::OK,
        Json(json!({ "mac": state.mac, "logs": logs })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_speaks_the_sync_protocol() {
        let stub = StubCollector::spawn("stub-a").await.unwrap();
        stub.push_device("aa:bb:cc:dd:ee:ff", json!({"rssi": -50}));

        let client = reqwest::Client::new();
        let url = format!("{}/logger", stub.base_url());

        // Malformed: 400, nothing recorded or consumed.
        let resp = client.post(&url).body("nope").send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        assert!(stub.registrations().is_empty());
        assert_eq!(stub.buffered(), 1);

        // Well-formed: registration recorded, buffer handed off and cleared.
        let resp = client
            .post(&url)
            .json(&json!({"si": 0, "ss": 2}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["mac"], "stub-a");
        assert_eq!(body["logs"].as_object().unwrap().len(), 1);
        assert_eq!(stub.registrations(), vec![(0, 2)]);
        assert_eq!(stub.buffered(), 0);
    }
}
