mod bootstrap;
mod chat;
mod health;

use std::time::Duration;

use anyhow::Result;
use analyst_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use analyst_core::config::LogFormat::*;
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
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let api_address =
        format!("{}:{}", app.config.server.bind_address, app.config.server.api_port);
    let listener = tokio::net::TcpListener::bind(&api_address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %api_address,
        "analyst-server started"
    );

    let graceful_window = app.config.server.graceful_shutdown_secs;
    axum::serve(listener, chat::router(app.chat_state))
        .with_graceful_shutdown(shutdown_signal(graceful_window))
        .await?;

    tracing::info!(event_name = "system.server.stopped", "analyst-server stopped");

    Ok(())
}

async fn shutdown_signal(graceful_window_secs: u64) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!(event_name = "system.server.stopping", "shutdown signal received");

    // In-flight requests get a bounded drain window; a stuck upstream call
    // must not hold the process open indefinitely.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(graceful_window_secs)).await;
        tracing::warn!(
            event_name = "system.server.forced_exit",
            "graceful shutdown window elapsed, exiting"
        );
        std::process::exit(0);
    });
}
