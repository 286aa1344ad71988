//! Transport adapter (component C7): the only layer that knows about HTTP
//! and WebSockets. Exposes the player channel, the admin channel (bearer
//! -gated at handshake), and a small HTTP surface (`/health`, `/api/config`,
//! `/api/admin/login`), mirroring the shape of the source signaling
//! server's `websocket::create_router` (`/ws`, `/health`, `/metrics`).

mod admin;
mod player;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatcher::Dispatcher;

/// Shared state handed to every HTTP/WebSocket handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<Config>,
}

/// Build the full Axum router: player channel, admin channel, and the
/// small JSON HTTP surface, wrapped in CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/ws", get(player::websocket_handler))
        .route("/admin/ws", get(admin::websocket_handler))
        .route("/health", get(health))
        .route("/api/config", get(api_config))
        .route("/api/admin/login", post(admin_login))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(cors_origins: &str) -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    if cors_origins == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<_> =
        cors_origins.split(',').filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok()).collect();

    if origins.is_empty() {
        tracing::warn!("no valid CORS origins configured, falling back to permissive CORS");
        return CorsLayer::permissive();
    }

    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health() -> Json<HealthPayload> {
    Json(HealthPayload { status: "ok", timestamp: chrono::Utc::now() })
}

#[derive(Serialize)]
struct ConfigPayload {
    #[serde(rename = "defaultMinesCount")]
    default_mines_count: i32,
    #[serde(rename = "gridSize")]
    grid_size: i32,
    #[serde(rename = "turnTimeLimit")]
    turn_time_limit: i64,
    #[serde(rename = "minRevealsToPass")]
    min_reveals_to_pass: u32,
}

async fn api_config(State(state): State<AppState>) -> Json<ConfigPayload> {
    let engine = state.config.engine;
    Json(ConfigPayload {
        default_mines_count: engine.mines_count,
        grid_size: engine.grid_size,
        turn_time_limit: engine.turn_time_limit_secs,
        min_reveals_to_pass: engine.min_reveals_to_pass,
    })
}

#[derive(Deserialize)]
struct AdminLoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct AdminLoginResponse {
    success: bool,
    token: Option<String>,
}

async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> (axum::http::StatusCode, Json<AdminLoginResponse>) {
    let security = &state.config.security;
    if crate::auth::verify_admin_password(security, &request.username, &request.password) {
        let token = state.dispatcher.admin_auth.issue_token();
        (axum::http::StatusCode::OK, Json(AdminLoginResponse { success: true, token: Some(token) }))
    } else {
        (axum::http::StatusCode::UNAUTHORIZED, Json(AdminLoginResponse { success: false, token: None }))
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::{connect_async, tungstenite::Message as TungsteniteMessage};

    use crate::admin::AdminSurface;
    use crate::auth::AdminAuth;
    use crate::config::Config;
    use crate::dispatcher::{Broadcaster, Dispatcher};
    use crate::journal::JournalManager;
    use crate::protocol::{ClientMessage, ServerMessage};
    use crate::room::RoomRegistry;

    use super::*;

    /// A real end-to-end round trip over a live TCP socket: bind the actual
    /// router, connect with `tokio-tungstenite`, send `create_room` over the
    /// wire, and assert a `room_created` frame comes back. Everything else
    /// in this crate's test suite drives the dispatcher in-process over a
    /// plain `mpsc` channel; this is the one test that proves the transport
    /// layer itself (framing, JSON encode/decode, the axum upgrade) works.
    #[tokio::test(flavor = "multi_thread")]
    async fn websocket_round_trip_creates_a_room() {
        tokio::time::timeout(tokio::time::Duration::from_secs(10), round_trip_impl())
            .await
            .expect("round trip test timed out after 10 seconds");
    }

    async fn round_trip_impl() {
        let tempdir = tempfile::tempdir().expect("failed to create temp dir for journal data");
        let mut config = Config::default();
        config.journal.data_dir = tempdir.path().to_string_lossy().into_owned();
        config.security.require_admin_auth = false;
        let config = Arc::new(config);

        let registry = Arc::new(RoomRegistry::new(config.room));
        let journal = Arc::new(JournalManager::new(config.journal.clone()));
        journal.ensure_dirs().await.expect("failed to create journal directories");
        let broadcaster = Arc::new(Broadcaster::new());
        let admin = Arc::new(AdminSurface::new());
        let admin_auth = Arc::new(AdminAuth::new(&config.security));
        let dispatcher = Dispatcher::new(&config, registry, journal, broadcaster, admin, admin_auth);

        let state = AppState { dispatcher, config };
        let router = create_router(state).into_make_service_with_connect_info::<SocketAddr>();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("failed to read local listener address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let url = format!("ws://{addr}/ws");
        let (ws_stream, _) = connect_async(&url).await.expect("failed to connect to websocket");
        let (mut sender, mut receiver) = ws_stream.split();

        let create_room = ClientMessage::CreateRoom { player_name: "Alice".to_string(), settings: None };
        let json = serde_json::to_string(&create_room).expect("failed to serialize create_room");
        sender.send(TungsteniteMessage::Text(json.into())).await.expect("failed to send create_room frame");

        let frame = receiver
            .next()
            .await
            .expect("connection closed before a response arrived")
            .expect("websocket read error");

        let TungsteniteMessage::Text(text) = frame else {
            panic!("expected a text frame, got {frame:?}");
        };
        let response: ServerMessage = serde_json::from_str(&text).expect("failed to deserialize server message");

        match response {
            ServerMessage::RoomCreated(payload) => {
                assert_eq!(payload.host_name, "Alice");
                assert_eq!(payload.room_code.len(), 6);
            }
            other => panic!("expected RoomCreated, got {other:?}"),
        }
    }
}
