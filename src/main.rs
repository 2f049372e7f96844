use anyhow::{Result, Context};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

mod ansible;
mod api;
mod classify;
mod config;
mod engine;
mod error;
mod models;
mod runner;

use crate::config::AppConfig;
use crate::engine::Monitor;
use crate::runner::ProcessRunner;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_ansi(true)
        .init();

    let config_path = "config.json";
    let config_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path))?;
    let config: AppConfig = serde_json::from_str(&config_content)
        .with_context(|| "Failed to parse config")?;
    config.target.validate()
        .context("Invalid monitoring target in config")?;

    let api_port = config.api_port;
    let monitor = Arc::new(Monitor::new(config, Arc::new(ProcessRunner)));

    let monitor_for_api = Arc::clone(&monitor);
    tokio::spawn(async move {
        api::start_server(api_port, monitor_for_api).await;
    });

    let monitor_clone = Arc::clone(&monitor);
    tokio::spawn(async move {
        if let Err(e) = monitor_clone.run().await {
            tracing::error!("Monitor engine failed: {}", e);
        }
    });

    signal::ctrl_c().await?;
    info!("Shutdown signal received. Closing SvcPulse sentinel...");

    Ok(())
}
