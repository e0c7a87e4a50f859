use std::sync::Arc;

use stockbourse::catalog::{self, CatalogStore};
use stockbourse::config::{CatalogConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_config = LogConfig::from_env("catalog");
    let _guard = stockbourse::logging::init(&log_config);

    let config = CatalogConfig::from_env();
    tracing::info!(address = %config.address(), data_path = %config.data_path, "starting catalog service");

    let store = Arc::new(CatalogStore::load(config.data_path.clone())?);
    store.clone().spawn_background_flush(config.flush_interval);

    let router = catalog::server::router(store);
    let listener = tokio::net::TcpListener::bind((config.bind_ip.as_str(), config.port)).await?;
    tracing::info!(address = %config.address(), bind = %config.bind_ip, "catalog listening");
    axum::serve(listener, router).await?;

    Ok(())
}
