use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use minesweeper_duel_server::admin::AdminSurface;
use minesweeper_duel_server::auth::AdminAuth;
use minesweeper_duel_server::config;
use minesweeper_duel_server::dispatcher::{Broadcaster, Dispatcher};
use minesweeper_duel_server::journal::JournalManager;
use minesweeper_duel_server::logging;
use minesweeper_duel_server::room::RoomRegistry;
use minesweeper_duel_server::transport::{self, AppState};

/// Minesweeper Duel -- authoritative server core for a two-player
/// competitive Minesweeper duel with live spectators and chat.
#[derive(Parser, Debug)]
#[command(name = "minesweeper-duel-server")]
#[command(about = "Authoritative room/engine/dispatch core for competitive Minesweeper duels")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config_security(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Host: {}", cfg.server.host);
                println!("  Port: {}", cfg.server.port);
                println!("  Grid size: {}", cfg.engine.grid_size);
                println!("  Mines: {}", cfg.engine.mines_count);
                println!("  Turn time limit: {}s", cfg.engine.turn_time_limit_secs);
                println!("  Room code length: {}", cfg.room.room_code_length);
                println!("  Admin auth required: {}", cfg.security.require_admin_auth);
                println!("  Journal data dir: {}", cfg.journal.data_dir);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::new(cfg.server.host.parse().unwrap_or_else(|_| [0, 0, 0, 0].into()), cfg.server.port);

    tracing::info!(%addr, "starting minesweeper duel server");

    let registry = Arc::new(RoomRegistry::new(cfg.room));
    let journal = Arc::new(JournalManager::new(cfg.journal.clone()));
    journal.ensure_dirs().await?;

    let broadcaster = Arc::new(Broadcaster::new());
    let admin_surface = Arc::new(AdminSurface::new());
    let admin_auth = Arc::new(AdminAuth::new(&cfg.security));

    let dispatcher =
        Dispatcher::new(&cfg, registry.clone(), journal.clone(), broadcaster.clone(), admin_surface.clone(), admin_auth);

    admin_surface.clone().spawn_stats_pump(registry.clone(), broadcaster.clone());
    spawn_idle_sweep(registry.clone(), journal.clone(), cfg.room.idle_sweep_interval_secs);
    spawn_orphan_sweep(registry.clone(), journal.clone(), cfg.room.idle_sweep_interval_secs);

    let state = AppState { dispatcher, config: cfg.clone() };
    let router = transport::create_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "minesweeper duel server listening");

    axum::serve(listener, router).await?;

    Ok(())
}

/// Periodically evict `waiting`/`finished` rooms older than the idle TTL
/// (§5 "Idle sweep every 5 minutes"; the interval itself is configurable).
fn spawn_idle_sweep(registry: Arc<RoomRegistry>, journal: Arc<JournalManager>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            let removed = registry.cleanup_idle_rooms().await;
            for code in removed {
                tracing::debug!(room_code = %code, "idle room swept");
                journal.close_room(&code).await;
            }
        }
    });
}

/// Archives any active-directory journal file whose room code is no longer
/// tracked by the registry (§4.4 "orphan sweep").
fn spawn_orphan_sweep(registry: Arc<RoomRegistry>, journal: Arc<JournalManager>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1) * 2));
        loop {
            interval.tick().await;
            let live_codes = registry.live_codes();
            journal.sweep_orphans(&live_codes).await;
        }
    });
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn default_has_no_flags() {
        let cli = Cli::try_parse_from(["minesweeper-duel-server"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn validate_and_print_config_conflict() {
        let result = Cli::try_parse_from(["minesweeper-duel-server", "--validate-config", "--print-config"]);
        assert!(result.is_err());
    }

    #[test]
    fn print_config_flag_parses() {
        let cli = Cli::try_parse_from(["minesweeper-duel-server", "--print-config"]).unwrap();
        assert!(cli.print_config);
    }
}
