use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::AppState;

/// GET /ws: pushes `state_changed` events to every connected client.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut rx = state.ws_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!("WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = next_event(&mut rx).await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(message = %text, "WebSocket message received");
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!("WebSocket connection closed");
}

/// Next change event for one client. A client that fell behind skips the
/// events it missed; `None` once the feed is closed.
async fn next_event(rx: &mut broadcast::Receiver<String>) -> Option<String> {
    loop {
        match rx.recv().await {
            Ok(msg) => return Some(msg),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "WebSocket client lagged, skipping events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lagging_client_keeps_receiving() {
        let (tx, mut rx) = broadcast::channel::<String>(2);
        for slice in ["user", "fans", "entries"] {
            tx.send(slice.to_string()).unwrap();
        }

        assert_eq!(next_event(&mut rx).await.as_deref(), Some("fans"));
        assert_eq!(next_event(&mut rx).await.as_deref(), Some("entries"));

        drop(tx);
        assert_eq!(next_event(&mut rx).await, None);
    }
}
