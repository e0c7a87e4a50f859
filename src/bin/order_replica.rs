use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use stockbourse::catalog::CatalogClient;
use stockbourse::config::{CatalogConfig, LogConfig, OrderReplicaConfig};
use stockbourse::order::server::OrderServerState;
use stockbourse::order::{self, OrderStore};

/// One Order replica (spec §4.2). `replica_id` is fixed at startup and
/// determines the bind port: `50053 + replica_id`.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long = "replica_id")]
    replica_id: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_config = LogConfig::from_env(&format!("order_replica_{}", args.replica_id));
    let _guard = stockbourse::logging::init(&log_config);

    let config = OrderReplicaConfig::from_env(args.replica_id);
    let port = config.port();
    tracing::info!(
        replica_id = config.replica_id,
        port,
        data_path = %config.data_path(),
        "starting order replica"
    );

    let store = Arc::new(OrderStore::load(config.data_path(), config.replica_id)?);
    store.clone().spawn_background_flush(config.flush_interval);

    let catalog_config = CatalogConfig::from_env();
    let catalog = CatalogClient::new(catalog_config.address(), Duration::from_secs(5));

    let router = order::server::router(OrderServerState { store, catalog });
    let listener = tokio::net::TcpListener::bind((config.bind_ip.as_str(), port)).await?;
    tracing::info!(%port, "order replica listening");
    axum::serve(listener, router).await?;

    Ok(())
}
