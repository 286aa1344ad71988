//! Admin channel: a WebSocket namespace gated by a bearer token validated
//! at handshake (§4.6, §6.1 auth). The token travels as a `?token=`
//! query parameter since browsers cannot attach custom headers to a
//! WebSocket upgrade request.

use std::net::SocketAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{AdminMessage, ErrorCode, ServerMessage};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminWsParams {
    token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<AdminWsParams>,
    State(state): State<AppState>,
) -> Response {
    let authorized = !state.config.security.require_admin_auth
        || params.token.as_deref().is_some_and(|token| state.dispatcher.admin_auth.validate_token(token));

    if !authorized {
        return ws.on_upgrade(move |socket| reject_handshake(socket, addr));
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

/// Closes the connection immediately with reason "auth failed" (§4.6, §7).
async fn reject_handshake(mut socket: WebSocket, addr: SocketAddr) {
    warn!(%addr, "admin websocket handshake rejected: auth failed");
    let _ = socket
        .send(Message::Close(Some(CloseFrame { code: 4001, reason: "auth failed".into() })))
        .await;
}

async fn handle_socket(socket: WebSocket, state: AppState, addr: SocketAddr) {
    let conn_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    state.dispatcher.broadcaster.register(conn_id, tx);
    debug!(%conn_id, %addr, "admin connection established");

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Ok(json) = serde_json::to_string(message.as_ref()) else {
                warn!("failed to serialize outbound admin message");
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
                debug!(%conn_id, error = %err, "admin websocket error");
                break;
            }
        };

        match frame {
            Message::Text(text) => match serde_json::from_str::<AdminMessage>(&text) {
                Ok(message) => state.dispatcher.handle_admin_message(conn_id, message).await,
                Err(err) => {
                    debug!(%conn_id, error = %err, "rejecting malformed admin frame");
                    state.dispatcher.broadcaster.send_to(conn_id, ServerMessage::AdminError { error: ErrorCode::Internal });
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    state.dispatcher.handle_disconnect(conn_id).await;
    send_task.abort();
    debug!(%conn_id, "admin connection closed");
}
