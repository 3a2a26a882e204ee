//! CementAI Optimizer API
//!
//! Serves comprehensive predictions, model status, knowledge refreshes and
//! the plant assistant over HTTP.

use anyhow::Result;
use optimizer_api::{api, bootstrap, config::ApiConfig};
use optimizer_lib::{health::HealthRegistry, SimulatedProvider};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting optimizer-api");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        project_id = %config.project_id,
        dataset_id = %config.dataset_id,
        warehouse = config.warehouse.backend.as_str(),
        "Optimizer configured"
    );

    let health_registry = HealthRegistry::new();
    let state = bootstrap::build_state(
        &config,
        Arc::new(SimulatedProvider::new()),
        health_registry.clone(),
    )?;
    bootstrap::register_components(&state).await;

    state.logger.log_startup(
        api::SERVICE_VERSION,
        state.warehouse.backend(),
        state.chat.backend_name().is_some(),
    );
    let logger = state.logger.clone();

    // Mark service as ready after initialization
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, Arc::new(state)));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("server exited"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("server error");
                    return Err(e);
                }
                Err(e) => {
                    logger.log_shutdown("server task panicked");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
