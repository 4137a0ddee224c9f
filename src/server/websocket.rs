//! WebSocket handler for live change notifications.
//!
//! Clients receive one small JSON event per backend change; the event
//! carries which collection changed, not the changed rows. A client that
//! wants the data refetches over the HTTP API, exactly like the sync
//! channel does.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde_json::json;

use super::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to backend change events
    let mut rx = state.update_tx.subscribe();

    // Spawn a task to forward change events to the client
    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let payload = json!({
                "type": "change",
                "collection": event.collection,
                "op": event.op,
            })
            .to_string();
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (nothing to do beyond keepalive)
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            // Axum answers pings automatically; just log them
            if let Message::Ping(data) = msg {
                tracing::debug!("Received ping: {:?}", data);
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }
}
