//! Admin authentication: a constant-time password check and an in-memory
//! bearer-token store.
//!
//! Full JWT issuance/verification is out of scope (§1). Login checks the
//! admin username/password, peppered with `signing_secret` and compared as
//! SHA-256 digests in constant time, then mints an opaque random bearer
//! token keyed to an expiry. The token itself is an unsigned random string
//! looked up by value in `AdminAuth`'s table — `signing_secret` only feeds
//! the password digest, it does not sign the token.

use dashmap::DashMap;
use rand::RngExt;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::SecurityConfig;

const TOKEN_LENGTH: usize = 32;
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn peppered_digest(secret: &str, value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

/// Compares a supplied password against the configured admin password in
/// constant time, by comparing SHA-256 digests rather than the raw bytes so
/// differing lengths don't leak through an early `memcmp` exit.
pub fn verify_admin_password(config: &SecurityConfig, username: &str, password: &str) -> bool {
    if username != config.admin_username {
        return false;
    }
    let expected = peppered_digest(&config.signing_secret, &config.admin_password);
    let supplied = peppered_digest(&config.signing_secret, password);
    expected.ct_eq(&supplied).into()
}

fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..TOKEN_ALPHABET.len());
            TOKEN_ALPHABET[idx] as char
        })
        .collect()
}

/// In-memory store of issued admin bearer tokens, keyed by the opaque token
/// string. Tokens are checked against wall-clock expiry on every lookup;
/// there is no background sweep since the table only grows by one entry per
/// admin login, which is rare compared to player traffic.
pub struct AdminAuth {
    ttl: chrono::Duration,
    tokens: DashMap<String, chrono::DateTime<chrono::Utc>>,
}

impl AdminAuth {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            ttl: chrono::Duration::seconds(config.admin_token_ttl_secs),
            tokens: DashMap::new(),
        }
    }

    /// Issue a new bearer token, valid for `admin_token_ttl_secs`.
    pub fn issue_token(&self) -> String {
        let token = generate_token();
        let expires_at = chrono::Utc::now() + self.ttl;
        self.tokens.insert(token.clone(), expires_at);
        token
    }

    /// Validate a bearer token presented at the admin WebSocket handshake or
    /// an authenticated HTTP call. Expired tokens are evicted on the lookup
    /// that discovers them.
    pub fn validate_token(&self, token: &str) -> bool {
        let Some(entry) = self.tokens.get(token) else {
            return false;
        };
        let expires_at = *entry.value();
        drop(entry);
        if expires_at < chrono::Utc::now() {
            self.tokens.remove(token);
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SecurityConfig {
        SecurityConfig {
            admin_username: "admin".to_string(),
            admin_password: "hunter2".to_string(),
            signing_secret: "pepper".to_string(),
            admin_token_ttl_secs: 60,
            require_admin_auth: true,
        }
    }

    #[test]
    fn correct_credentials_are_accepted() {
        assert!(verify_admin_password(&config(), "admin", "hunter2"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        assert!(!verify_admin_password(&config(), "admin", "wrong"));
    }

    #[test]
    fn wrong_username_is_rejected() {
        assert!(!verify_admin_password(&config(), "nobody", "hunter2"));
    }

    #[test]
    fn issued_token_validates_until_expiry() {
        let auth = AdminAuth::new(&config());
        let token = auth.issue_token();
        assert!(auth.validate_token(&token));
        assert!(!auth.validate_token("not-a-real-token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut cfg = config();
        cfg.admin_token_ttl_secs = -1;
        let auth = AdminAuth::new(&cfg);
        let token = auth.issue_token();
        assert!(!auth.validate_token(&token));
    }
}
