//! WebSocket push channel
//!
//! Each connection registers one observer. The observer's queue is forwarded
//! to the socket as `new_data` events: the history replay first, then live
//! records. A slow socket only delays its own task.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::record::PushEvent;

use super::routes::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forward records to one viewer until either side goes away
async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = state.broadcaster.register();
    let observer = subscription.id();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(
        observer = %observer,
        replayed = subscription.replayed(),
        "Client connected"
    );

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            record = subscription.recv() => {
                let Some(record) = record else {
                    // Dropped by the broadcaster for lagging
                    tracing::info!(observer = %observer, "Observer stream ended, closing socket");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };

                let json = match serde_json::to_string(&PushEvent::from(record)) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize record");
                        continue;
                    }
                };

                match tokio::time::timeout(state.send_timeout, sender.send(Message::Text(json.into()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(observer = %observer, error = %e, "Send failed");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!(observer = %observer, "Send timed out");
                        break;
                    }
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(observer = %observer, error = %e, "Receive failed");
                        break;
                    }
                }
            }
        }
    }

    state.broadcaster.deregister(observer);
    tracing::info!(observer = %observer, "Client disconnected");
}
