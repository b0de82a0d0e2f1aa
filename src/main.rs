use airguard::api::build_router;
use airguard::config::load_from_env;
use airguard::source;
use airguard::state::{run_sampler, MonitorEngine};
use airguard::threshold::SharedThresholds;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airguard=info".into()),
        )
        .init();

    info!("Ship Air Guard starting...");

    let config = load_from_env()?;
    let table = config.validate().context("invalid configuration")?;

    let engine = Arc::new(MonitorEngine::new(
        &config.zones,
        SharedThresholds::new(table),
        config.history.capacity,
    ));
    info!(
        zones = config.zones.len(),
        history_capacity = config.history.capacity,
        "Monitoring engine initialized"
    );

    let reading_source = source::from_config(&config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sampler = tokio::spawn(run_sampler(
        Arc::clone(&engine),
        reading_source,
        Duration::from_millis(config.sampler.interval_ms),
        shutdown_rx,
    ));

    let app = build_router(Arc::clone(&engine), config.api.admin_token.clone());

    let listener = tokio::net::TcpListener::bind(&config.api.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.api.bind))?;
    info!(bind = %config.api.bind, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("HTTP server error")?;

    sampler.await.context("sampler task failed")?;

    info!("Ship Air Guard stopped");
    Ok(())
}
