//! Runs a standalone intent broker until interrupted.
//!
//! Usage:
//!
//! ```text
//! intent_broker [config.toml]
//! ```
//!
//! Without a path, configuration comes from `INTENT_BROKER_*` environment
//! variables. Log filtering follows `RUST_LOG` (default `info`).
//!
//! The broker core is transport-agnostic; this binary hosts the registry,
//! the liveness loop, and the HTTP invocation transport, and is intended to
//! be embedded behind a wire front-end bound to the configured address.

use intent_broker::broker::IntentBroker;
use intent_broker::config::{BrokerConfig, ConfigError};
use intent_broker::invocation::adapters::HttpEndpointTransport;
use intent_broker::invocation::ports::TransportError;
use intent_broker::registry::adapters::InMemoryServiceRegistry;
use mockable::DefaultClock;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport init failed: {0}")]
    Transport(#[from] TransportError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let config = load_config()?;
    let runtime = build_runtime()?;
    runtime.block_on(serve(config)).map_err(Into::into)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config() -> Result<BrokerConfig, StartupError> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => BrokerConfig::from_file(path)?,
        None => BrokerConfig::from_env()?,
    };
    Ok(config)
}

fn build_runtime() -> Result<tokio::runtime::Runtime, StartupError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::RuntimeInit)
}

async fn serve(config: BrokerConfig) -> Result<(), StartupError> {
    let broker = IntentBroker::new(
        Arc::new(InMemoryServiceRegistry::new()),
        Arc::new(HttpEndpointTransport::new()?),
        Arc::new(DefaultClock),
        &config,
    );
    let liveness = broker.spawn_liveness();
    tracing::info!(
        listen_address = config.listen_address.as_str(),
        heartbeat_interval_ms = config.heartbeat_interval_ms,
        status = %broker.health_check().await,
        "intent broker ready"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(StartupError::Signal)?;

    broker.shutdown();
    if let Err(err) = liveness.await {
        tracing::warn!(error = %err, "liveness task ended abnormally");
    }
    Ok(())
}
