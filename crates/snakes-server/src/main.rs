//! # snakes server
//!
//! Loads configuration, opens the database according to the startup policy,
//! and serves the REST API until SIGINT/SIGTERM. The connectivity resource is
//! closed after the last in-flight request finishes.

use clap::{Parser, ValueEnum};
use snakes_api::{AppState, build_router};
use snakes_db::Database;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Read-only REST API over the snakes table.
#[derive(Debug, Parser)]
#[command(name = "snakes", version, about)]
struct Cli {
    /// Address to bind, overriding HOST / server.host
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding PORT / server.port
    #[arg(long)]
    port: Option<u16>,

    /// Log output format
    #[arg(long, env = "SNAKES_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = snakes_common::config::load()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Initialize tracing (structured logging)
    init_tracing(cli.log_format);

    tracing::info!("Starting snakes v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = %config.server.environment,
        mode = ?config.database.mode,
        fail_fast = config.database.fail_fast(),
        "Configuration loaded"
    );

    // Connect to the database; errors here are fatal only under fail-fast
    let db = Database::connect(&config.database).await?;

    let app = build_router(AppState::new(db.clone(), &config));
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "snakes=debug,tower_http=debug".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting shutdown"),
    }
}
