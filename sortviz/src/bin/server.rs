//! Sortviz server binary

use anyhow::{Context, Result};
use sortviz::SortvizConfig;
use sortviz::api::{ApiState, create_router};
use sortviz::broadcast::EventBus;
use sortviz::orchestrator::SortOrchestrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn load_config() -> Result<(SortvizConfig, Option<String>)> {
    let config_path = match std::env::args().nth(1) {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.to_string(),
        None => return Ok((SortvizConfig::default(), None)),
    };

    let config_contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path))?;

    let config = SortvizConfig::from_toml(&config_contents)
        .with_context(|| format!("Failed to parse config file: {}", config_path))?;

    Ok((config, Some(config_path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_path) = load_config()?;

    // Initialize logging
    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("Invalid log_level: {}", config.log_level))?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Sortviz Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = config_path.as_deref().unwrap_or("<defaults>"),
        algorithms = ?config.algorithms,
        max_array_len = config.max_array_len,
        broadcast = config.broadcast.enabled,
        "Loaded configuration"
    );

    let events = EventBus::new(config.broadcast.capacity);
    let orchestrator = SortOrchestrator::new(&config, events.clone())
        .context("Invalid algorithm list in configuration")?;

    let state = Arc::new(ApiState::new(orchestrator, events));
    let app = create_router(state);

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid server host: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
