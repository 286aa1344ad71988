//! Player channel: accepts a WebSocket connection, registers it with the
//! [`Broadcaster`], and pumps inbound [`ClientMessage`]s into the
//! dispatcher until the socket closes.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{ClientMessage, ErrorCode, ServerMessage};

use super::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

async fn handle_socket(socket: WebSocket, state: AppState, addr: SocketAddr) {
    let conn_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    state.dispatcher.broadcaster.register(conn_id, tx);
    debug!(%conn_id, %addr, "player connection established");

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Ok(json) = serde_json::to_string(message.as_ref()) else {
                warn!("failed to serialize outbound server message");
                continue;
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    while let Some(frame) = receiver.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%conn_id, error = %err, "player websocket error");
                break;
            }
        };

        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => state.dispatcher.handle_client_message(conn_id, message).await,
                Err(err) => {
                    debug!(%conn_id, error = %err, "rejecting malformed client frame");
                    state.dispatcher.broadcaster.send_to(conn_id, ServerMessage::Error { error: ErrorCode::Internal });
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    state.dispatcher.handle_disconnect(conn_id).await;
    send_task.abort();
    debug!(%conn_id, "player connection closed");
}
