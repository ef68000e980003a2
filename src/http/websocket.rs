//! WebSocket push channel.
//!
//! # Responsibilities
//! - Upgrade `GET /ws` to a WebSocket
//! - Send the current table as a `snapshot` message on connect
//! - Forward every `transition` notice from the push hub
//! - Answer a `ping` text frame with `pong`
//!
//! # Design Decisions
//! - The client subscribes before the snapshot is taken, so no transition
//!   between the two is missed (it may be seen twice)
//! - Lagging clients skip ahead to the newest notice
//! - The connection task holds only the hub, never the store, and closes
//!   the socket when the server shuts down

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::http::server::AppState;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::push::{PushHub, StatusNotice};

pub async fn push_updates(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let push = state.push.clone();
    let closing = state.closing.clone();

    // Subscribe before the snapshot is taken.
    let rx = push.subscribe();
    let snapshot = StatusNotice::Snapshot {
        booted_at: state.store.booted_at(),
        hosts: state.store.snapshot(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, push, rx, snapshot, closing))
}

async fn handle_socket(
    mut socket: WebSocket,
    push: PushHub,
    mut rx: broadcast::Receiver<StatusNotice>,
    snapshot: StatusNotice,
    closing: Shutdown,
) {
    metrics::set_push_clients(push.client_count());
    tracing::debug!(clients = push.client_count(), "Push client connected");

    if send_notice(&mut socket, &snapshot).await {
        forward(&mut socket, &mut rx, &closing).await;
    }

    drop(rx);
    metrics::set_push_clients(push.client_count());
    tracing::debug!(clients = push.client_count(), "Push client disconnected");
}

async fn forward(
    socket: &mut WebSocket,
    rx: &mut broadcast::Receiver<StatusNotice>,
    closing: &Shutdown,
) {
    let shutdown = closing.wait();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            notice = rx.recv() => match notice {
                Ok(notice) => {
                    if !send_notice(socket, &notice).await {
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Push client lagged, skipping ahead");
                }
                Err(RecvError::Closed) => return,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) if text.as_str() == "ping" => {
                    if socket.send(Message::Text("pong".into())).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "WebSocket error");
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Returns false once the client is gone.
async fn send_notice(socket: &mut WebSocket, notice: &StatusNotice) -> bool {
    let json = match serde_json::to_string(notice) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize push notice");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
