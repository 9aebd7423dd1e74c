//! sisfo-assessment - Assessment service entry point
//!
//! Serves the grading and report card API. Rendered report cards are written
//! below the storage path and served back under `/files`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sisfo_common::config::{init_tracing, load_dotenv, CommonArgs, ServiceConfig};
use sisfo_common::db::init_database;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info};

use sisfo_assessment::services::storage::LocalStorage;
use sisfo_assessment::{build_router, AppState, DEFAULT_PORT};

/// Command-line arguments for sisfo-assessment
#[derive(Parser, Debug)]
#[command(name = "sisfo-assessment")]
#[command(about = "Assessment service for SISFO")]
#[command(version)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    let config = ServiceConfig::resolve(&args.common, DEFAULT_PORT).context("Invalid configuration")?;

    init_tracing(&config.log_level);
    info!("Starting sisfo-assessment v{}", env!("CARGO_PKG_VERSION"));

    let pool = init_database(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready: {}", config.database_url);

    tokio::fs::create_dir_all(&config.storage_path)
        .await
        .with_context(|| format!("Failed to create storage directory {}", config.storage_path.display()))?;
    let storage = LocalStorage::new(config.storage_path.clone(), config.storage_base_url.clone());
    info!(
        "Report cards stored in {} and served from {}",
        config.storage_path.display(),
        config.storage_base_url
    );

    let files = ServeDir::new(storage.root());
    let state = AppState::new(pool, config.call_timeout, Arc::new(storage));
    let app = build_router(state).nest_service("/files", files);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("sisfo-assessment listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
