use stockbourse::config::{FrontendConfig, LogConfig};
use stockbourse::frontend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_config = LogConfig::from_env("frontend");
    let _guard = stockbourse::logging::init(&log_config);

    let config = FrontendConfig::from_env();
    tracing::info!(port = config.port, replicas = ?config.replicas, "starting frontend");

    let (router, coordinator) = frontend::build(&config);

    // Elect a leader before accepting traffic so the first request does
    // not pay the no-leader-yet path.
    coordinator.refresh_leadership().await;
    coordinator
        .clone()
        .spawn_background_fault_check(config.health_sweep_interval);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "frontend listening");
    axum::serve(listener, router).await?;

    Ok(())
}
