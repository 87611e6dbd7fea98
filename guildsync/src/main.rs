//! guildsync - roster to spreadsheet synchronization service
//!
//! Serves `POST /sync`, `POST /sync/background` and `GET /health`.
//! Background syncs are drained before the process exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use guildsync::config::SyncSettings;
use guildsync::http::ReqwestTransport;
use guildsync::keep_alive::TaskTrackerKeepAlive;
use guildsync::notifier::FollowUpNotifier;
use guildsync::services::SyncOrchestrator;
use guildsync::{build_router, AppState};
use guildsync_common::config::TomlConfig;
use guildsync_common::{SystemClock, UuidGenerator};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for guildsync
#[derive(Parser, Debug)]
#[command(name = "guildsync")]
#[command(about = "Synchronize a guild roster into a spreadsheet")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long, env = "GUILDSYNC_BIND_ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("guildsync={},tower_http=info", config.logging.level).into()),
        )
        .init();

    info!("Starting guildsync v{}", env!("CARGO_PKG_VERSION"));

    let settings = SyncSettings::from_toml(&config);
    if settings.bot_token.is_empty() {
        warn!("No bot token configured; roster requests will be rejected upstream");
    }
    if settings.spreadsheet_id.is_none() {
        warn!("No spreadsheet configured; every sync will be refused");
    }
    if config.security.shared_secret.is_none() {
        info!("Request signature check disabled (no shared secret)");
    }

    let transport = Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);
    let clock = Arc::new(SystemClock);
    let keep_alive = Arc::new(TaskTrackerKeepAlive::new());
    let notifier = Arc::new(FollowUpNotifier::new(
        transport.clone(),
        settings.discord_api_base.clone(),
    ));

    let orchestrator = SyncOrchestrator::new(
        transport,
        clock.clone(),
        Arc::new(UuidGenerator),
        settings,
    )
    .with_keep_alive(keep_alive.clone())
    .with_notifier(notifier);

    let state = AppState::new(orchestrator, config.security.shared_secret.clone(), clock);
    let app = build_router(state);

    let bind_addr = args.bind.unwrap_or(config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("guildsync listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let pending = keep_alive.in_flight();
    if pending > 0 {
        info!(pending, "Waiting for background syncs to finish");
    }
    keep_alive.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
