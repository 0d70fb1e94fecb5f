//! HTTP surface: dashboard page, push channel, query ingest, health.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::Serialize;

use crate::monitor::Monitor;
use crate::queries::QueryEvent;
use crate::types::FullState;
use crate::ui;

pub type AppState = Arc<Monitor>;

pub fn router(monitor: AppState) -> Router {
    Router::new()
        .route("/", get(ui::dashboard_handler))
        .route("/ws", get(ws_handler))
        .route("/queries", post(ingest_query))
        .route("/snapshot", get(snapshot))
        .route("/healthz", get(healthz))
        .with_state(monitor)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn snapshot(State(monitor): State<AppState>) -> Json<FullState> {
    Json(monitor.full_state())
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub recorded: bool,
    pub warning: bool,
}

async fn ingest_query(
    State(monitor): State<AppState>,
    Json(event): Json<QueryEvent>,
) -> (StatusCode, Json<IngestResponse>) {
    debug!("[api] query event {:?}", event.name);
    let record = monitor.on_query_event(&event);
    let response = IngestResponse {
        recorded: record.is_some(),
        warning: record.is_some_and(|r| r.warning),
    };
    (StatusCode::ACCEPTED, Json(response))
}

async fn ws_handler(ws: WebSocketUpgrade, State(monitor): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, monitor))
}

/// Lifecycle of one push-channel subscriber: register, start the writer
/// task pumping the outbound queue, open (handshake), treat every inbound
/// frame as a pull request, unregister on close or read error.
async fn handle_socket(socket: WebSocket, monitor: AppState) {
    let (id, mut outbound) = monitor.hub().connect();
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if let Err(err) = sink.send(Message::Text(payload.as_ref().into())).await {
                debug!("[api] subscriber {id} send failed: {err}");
                break;
            }
        }
    });
    monitor.hub().open(id);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                monitor.on_client_message(id, text.as_str());
            }
            Ok(Message::Binary(bytes)) => {
                monitor.on_client_message(id, &String::from_utf8_lossy(&bytes));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!("[api] subscriber {id} read error: {err}");
                break;
            }
        }
    }

    monitor.hub().disconnect(id);
    writer.abort();
}
