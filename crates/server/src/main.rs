mod bootstrap;
mod health;
mod telegram;
mod webhook;

use std::time::Duration;

use anyhow::Result;
use meesaya_core::config::{AppConfig, LoadOptions};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use meesaya_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
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

    if let Some(public_url) = app.config.telegram.public_url.as_deref() {
        match app.messenger.set_webhook(public_url).await {
            Ok(url) => tracing::info!(
                event_name = "system.server.webhook_registered",
                correlation_id = "bootstrap",
                webhook_url = %url,
                "telegram webhook registered"
            ),
            Err(error) => tracing::warn!(
                event_name = "system.server.webhook_failed",
                correlation_id = "bootstrap",
                error = %error,
                "telegram webhook registration failed"
            ),
        }
    }

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let worker = webhook::spawn_worker(app.orchestrator.clone(), inbound_rx);
    let routes = webhook::router(inbound_tx).merge(health::router(app.db_pool.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "meesaya-server listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, routes)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "meesaya-server stopping"
    );
    let _ = stop_tx.send(());

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, server).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before the grace period"
        );
    }
    worker.abort();
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
