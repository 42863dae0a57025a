//! Live playback event stream over WebSocket. Each engine event is pushed to
//! the client as one JSON text frame; the map client is the render sink.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/playback/events", get(events))
}

async fn events(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, state))
}

async fn stream_events(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    let mut events = state.player().subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Late joiners get the current state before live events.
    let hello = json!({
        "type": "hello",
        "session_id": session_id,
        "playback": state.player().snapshot().await,
    });
    if ws_tx.send(Message::Text(hello.to_string())).await.is_err() {
        return;
    }
    tracing::info!("Event stream {} connected", session_id);

    let sender_session = session_id.clone();
    let mut sender_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event stream {} lagged, skipped {} events", sender_session, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to serialize playback event: {e}");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // The stream is push-only; drain client frames until it goes away.
    let mut receiver_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut sender_task => receiver_task.abort(),
        _ = &mut receiver_task => sender_task.abort(),
    }
    tracing::info!("Event stream {} disconnected", session_id);
}
