mod bootstrap;
mod chat;
mod health;
mod lex;
mod mail;
mod routes;
mod search;
mod worker;

use std::time::Duration;

use anyhow::Result;
use foody_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use foody_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if app.config.queue.worker_enabled {
        Some(worker::spawn(
            app.worker.clone(),
            Duration::from_secs(app.config.queue.wait_time_secs),
            shutdown_rx,
        ))
    } else {
        info!(
            event_name = "worker.loop.disabled",
            correlation_id = "bootstrap",
            "suggestion worker disabled by configuration"
        );
        None
    };

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "foody-server listening"
    );

    axum::serve(listener, routes::router(app.state.clone()))
        .with_graceful_shutdown(async move {
            wait_for_shutdown().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "foody-server stopping"
    );

    if let Some(handle) = worker_handle {
        let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
        if tokio::time::timeout(grace, handle).await.is_err() {
            warn!(
                event_name = "worker.loop.shutdown_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "suggestion worker did not stop within the grace period"
            );
        }
    }

    app.db_pool.close().await;
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for ctrl-c; shutting down"
        );
    }
}
