//! Admin credential and bearer-token configuration (component C6/C7).

use super::defaults::{default_admin_token_ttl_secs, default_admin_username, default_require_admin_auth};
use serde::{Deserialize, Serialize};

/// Configuration for the admin HTTP login and the admin WebSocket channel's
/// handshake bearer check. The signing secret and password are expected to
/// be supplied via environment override in any real deployment; the
/// compiled-in defaults exist only so the server boots for local
/// development without an explicit config file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Admin login username.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Admin login password, compared in constant time.
    #[serde(default)]
    pub admin_password: String,
    /// Pepper mixed into the admin password digest before comparison; not
    /// used to sign bearer tokens, which are opaque random strings looked
    /// up by value.
    #[serde(default)]
    pub signing_secret: String,
    /// Bearer token lifetime, in seconds.
    #[serde(default = "default_admin_token_ttl_secs")]
    pub admin_token_ttl_secs: i64,
    /// Whether the admin WebSocket channel requires a valid bearer token at
    /// handshake. Disabling this is only appropriate for local development.
    #[serde(default = "default_require_admin_auth")]
    pub require_admin_auth: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: String::new(),
            signing_secret: String::new(),
            admin_token_ttl_secs: default_admin_token_ttl_secs(),
            require_admin_auth: default_require_admin_auth(),
        }
    }
}
