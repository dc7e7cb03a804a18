use airflux::api::create_router;
use airflux::config::{load_config, AirfluxConfig};
use airflux::engine::{run_metrics_broadcaster, DashboardEngine, EngineCommand};
use airflux::feed::SnapshotFeed;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airflux=info".into()),
        )
        .init();

    info!("Airflux starting...");

    let config = match std::env::var("AIRFLUX_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration");
            load_config(&path)?
        }
        Err(_) => {
            info!("AIRFLUX_CONFIG not set, using defaults");
            AirfluxConfig::default()
        }
    };

    info!(
        nats_url = %config.nats.url,
        subject = %config.nats.subject,
        bind_addr = %config.api.bind_addr,
        frame_rate = config.engine.frame_rate,
        "Configuration loaded"
    );

    // Engine task
    let engine = DashboardEngine::new(&config);
    let (command_tx, command_rx) = mpsc::channel(config.engine.command_buffer.max(1));
    let handle = engine.handle(command_tx);
    let engine_task = tokio::spawn(engine.run(command_rx));

    // Metrics broadcaster
    tokio::spawn(run_metrics_broadcaster(
        handle.clone(),
        config.metrics.broadcast_interval_seconds,
    ));

    // Snapshot feed
    let feed = SnapshotFeed::connect(config.nats.clone()).await?;
    let feed_handle = handle.clone();
    let feed_task = tokio::spawn(async move {
        if let Err(e) = feed.run(feed_handle).await {
            error!(error = %e, "Snapshot feed error");
        }
    });

    // HTTP / WebSocket server
    let router = create_router(handle.clone());
    let listener = tokio::net::TcpListener::bind(&config.api.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.api.bind_addr))?;
    info!(addr = %config.api.bind_addr, "API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    // Graceful shutdown
    server_handle.abort();
    feed_task.abort();
    if handle.send(EngineCommand::Shutdown).await.is_err() {
        warn!("Engine already stopped");
    }
    if let Err(e) = engine_task.await {
        error!(error = %e, "Engine task failed");
    }
    info!("Airflux stopped");

    Ok(())
}
