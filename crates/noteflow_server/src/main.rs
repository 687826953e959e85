//! `noteflow` server binary.
//!
//! Startup order: config, logging, database, AI client, router, listener.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use noteflow_server::ai::client::HttpAiClient;
use noteflow_server::config::ServerConfig;
use noteflow_server::{build_router, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let log_dir = config.resolved_log_dir();
    noteflow_core::init_logging(&config.resolved_log_level(), &log_dir)
        .with_context(|| format!("failed to initialize logging in {}", log_dir.display()))?;

    let db_path = config.resolved_db_path();
    let conn = noteflow_core::open_db(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    info!(
        "event=db_open module=server status=ok path={}",
        noteflow_core::sanitize_log_value(&db_path.display().to_string(), 200)
    );

    let ai = HttpAiClient::from_config(&config).context("failed to build AI client")?;
    let state = AppState::new(conn, Arc::new(ai));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(
        "event=server_start module=server status=ok bind={} version={} ai_base_url={}",
        config.bind,
        env!("CARGO_PKG_VERSION"),
        config.ai_base_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("event=shutdown_signal module=server status=error error={err}");
    }
}
