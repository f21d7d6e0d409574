use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::constants::POOL_HEARTBEAT_INTERVAL_SECS;
use crate::gateway::{ServerEvent, SessionGateway};
use crate::state::AppState;

/// Upgrades to the session protocol; one task per connection
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let gateway = state.gateway.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, gateway))
}

async fn handle_socket(mut socket: WebSocket, gateway: Arc<SessionGateway>) {
    // The connection handle doubles as the pool entry id
    let entry_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    gateway.connect(&entry_id, tx).await;
    let mut heartbeat = tokio::time::interval(Duration::from_secs(POOL_HEARTBEAT_INTERVAL_SECS));

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                gateway.heartbeat(&entry_id).await;
            }
            // Outbound: events queued by this or any other connection's search
            Some(event) = rx.recv() => {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(%entry_id, "failed to encode session event: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        gateway.handle_text(&entry_id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%entry_id, "websocket error: {}", e);
                        break;
                    }
                    _ => {} // Binary and ping/pong frames are not part of the protocol
                }
            }
        }
    }

    gateway.disconnect(&entry_id).await;
}
