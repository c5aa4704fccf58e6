// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket handler for monitor subscribers.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use crate::events::{ClientCommand, MonitorEvent};
use crate::state::{epoch_ms, AppState};

/// `GET /ws` — WebSocket upgrade for a monitor subscriber.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per-connection handler: forwards registry events out, parses commands in.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let id = state.registry.add(tx).await;
    tracing::info!(conn = %id, clients = state.registry.len().await, "subscriber connected");

    state
        .registry
        .send_to(
            &id,
            MonitorEvent::Connected {
                message: "WebSocket connection established".to_owned(),
                timestamp: epoch_ms(),
            },
        )
        .await;

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            // Forward monitor events to this subscriber.
            event = rx.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            // Handle commands from this subscriber.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_text(&state, &id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.registry.remove(&id).await;
    tracing::info!(conn = %id, clients = state.registry.len().await, "subscriber disconnected");
}

/// Handle one text message from a subscriber.
///
/// Engine calls that poll upstream are spawned so the read loop never blocks
/// on provider latency.
pub(crate) async fn handle_client_text(state: &Arc<AppState>, conn: &Uuid, text: &str) {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(_) => {
            state
                .registry
                .send_to(conn, MonitorEvent::Error { message: "Unknown message type".to_owned() })
                .await;
            return;
        }
    };

    let Some(engine) = state.engine.as_ref() else {
        state
            .registry
            .send_to(
                conn,
                MonitorEvent::Error {
                    message: "Monitoring unavailable - credentials not configured".to_owned(),
                },
            )
            .await;
        return;
    };

    match command {
        ClientCommand::StartMonitoring { run_id } => {
            let engine = Arc::clone(engine);
            tokio::spawn(async move {
                engine.start_watch(run_id).await;
            });
        }
        ClientCommand::StopMonitoring => {
            engine.stop_watch().await;
        }
        ClientCommand::GetLatestRun => {
            let engine = Arc::clone(engine);
            tokio::spawn(async move {
                engine.discover_latest().await;
            });
        }
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
