//! HTTP/WebSocket listener configuration.

use super::defaults::{default_cors_origins, default_host, default_port};
use serde::{Deserialize, Serialize};

/// Bind address and CORS policy for the transport adapter (C7).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind the HTTP/WebSocket listener on.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind the HTTP/WebSocket listener on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins (comma-separated, or "*" for any).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}
