//! Configuration validation.

use super::Config;

/// Validate configuration invariants that cannot be expressed as serde
/// defaults. Called once at startup by `main`; `load()` itself only logs
/// validation failures so that `--print-config`/tests can still inspect a
/// loaded-but-invalid document.
pub fn validate_config_security(config: &Config) -> anyhow::Result<()> {
    config
        .engine
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid engine configuration: {e}"))?;

    if config.room.room_code_length == 0 {
        anyhow::bail!("room.room_code_length must be at least 1");
    }

    if config.security.require_admin_auth {
        if config.security.admin_password.is_empty() {
            anyhow::bail!(
                "security.require_admin_auth is true but security.admin_password is empty; \
                 set MINESWEEPER__security__admin_password or disable admin auth for local dev"
            );
        }
        if config.security.signing_secret.is_empty() {
            anyhow::bail!(
                "security.require_admin_auth is true but security.signing_secret is empty; \
                 set MINESWEEPER__security__signing_secret"
            );
        }
        if is_production_mode() && config.security.signing_secret.len() < 16 {
            eprintln!(
                "WARNING: security.signing_secret is very short ({} chars); recommend >= 32",
                config.security.signing_secret.len()
            );
        }
    }

    Ok(())
}

/// Detect production mode via well-known environment variables, matching
/// the convention used by the rest of the ambient stack.
pub fn is_production_mode() -> bool {
    use std::env;
    if let Ok(mode) = env::var("MINESWEEPER__ENVIRONMENT") {
        return mode.eq_ignore_ascii_case("production") || mode.eq_ignore_ascii_case("prod");
    }
    env::var("MINESWEEPER_PRODUCTION").is_ok()
        || env::var("PRODUCTION").is_ok()
        || env::var("PROD").is_ok()
}
