use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::catalog::CatalogClient;
use crate::config::FrontendConfig;

use super::cache::LruStockCache;
use super::handlers;
use super::replication::ReplicationCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<LruStockCache>,
    pub catalog: CatalogClient,
    pub coordinator: Arc<ReplicationCoordinator>,
}

/// Builds the Frontend's HTTP surface (spec §6, port 8081) and the
/// shared, process-wide replication state behind it.
pub fn build(config: &FrontendConfig) -> (Router, Arc<ReplicationCoordinator>) {
    let coordinator = Arc::new(ReplicationCoordinator::new(&config.replicas, config.rpc_timeout));
    let catalog = CatalogClient::new(config.catalog.address(), config.rpc_timeout);
    let cache = Arc::new(LruStockCache::new(config.cache_capacity));

    let state = AppState {
        cache,
        catalog,
        coordinator: coordinator.clone(),
    };

    let router = Router::new()
        .route("/stocks/{name}", get(handlers::get_stock))
        .route("/orders", post(handlers::place_order))
        .route("/orders/{tid}", get(handlers::look_up_order))
        .with_state(state);

    (router, coordinator)
}
