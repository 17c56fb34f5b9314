//! `/ws` price stream.

use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{IntoResponse, Response},
};
use log::{debug, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::adapters::push_hub::PushEnvelope;

use super::{AppState, WebError};

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    match state.hub.subscribe() {
        Some(rx) => ws.on_upgrade(move |socket| forward(socket, rx)),
        None => WebError::service_unavailable("Price stream is not running").into_response(),
    }
}

async fn send(socket: &mut WebSocket, envelope: &PushEnvelope) -> bool {
    match serde_json::to_string(envelope) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("failed to encode push envelope: {}", e);
            true
        }
    }
}

/// Sends the welcome envelope, then relays hub traffic until either side closes.
async fn forward(mut socket: WebSocket, mut rx: broadcast::Receiver<PushEnvelope>) {
    if !send(&mut socket, &PushEnvelope::welcome()).await {
        return;
    }
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(envelope) => {
                    if !send(&mut socket, &envelope).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("push subscriber lagged, skipped {} updates", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    let _ = socket.send(Message::Close(None)).await;
    debug!("push subscriber disconnected");
}
