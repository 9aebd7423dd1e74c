//! sisfo-academic - Academic service entry point
//!
//! Serves the schedule, semester, enrollment and curriculum API and, when a
//! NATS URL is configured, consumes student registrations from admission.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use sisfo_common::config::{init_tracing, load_dotenv, CommonArgs, ServiceConfig};
use sisfo_common::db::init_database;
use tokio::signal;
use tracing::{error, info};

use sisfo_academic::events::RegistrationConsumer;
use sisfo_academic::{build_router, AppState, DEFAULT_PORT};

/// Command-line arguments for sisfo-academic
#[derive(Parser, Debug)]
#[command(name = "sisfo-academic")]
#[command(about = "Academic service for SISFO")]
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
    info!("Starting sisfo-academic v{}", env!("CARGO_PKG_VERSION"));

    let pool = init_database(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready: {}", config.database_url);

    let state = AppState::new(pool, config.call_timeout);

    match &config.nats_url {
        Some(url) => {
            let consumer = RegistrationConsumer::connect(url, state.students.clone())
                .await
                .context("Failed to connect to NATS")?;
            tokio::spawn(async move {
                if let Err(e) = consumer.run().await {
                    error!("Student registration consumer stopped: {}", e);
                }
            });
        }
        None => info!("SISFO_NATS_URL not set, student registration ingress disabled"),
    }

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("sisfo-academic listening on http://{}", addr);

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
