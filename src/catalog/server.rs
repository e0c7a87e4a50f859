use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::store::{CatalogStore, UpdateOutcome};

/// Internal RPC surface for the Catalog service (spec §4.1, §6: port 50052).
/// Plain HTTP+JSON rather than a gRPC transport — see `DESIGN.md`.
pub fn router(store: Arc<CatalogStore>) -> Router {
    Router::new()
        .route("/rpc/lookup-stock", post(lookup_stock))
        .route("/rpc/update-stock", post(update_stock))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
pub struct LookupStockRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupStockResponse {
    pub exists: bool,
    pub name: String,
    pub price: f64,
    pub quantity: u64,
}

async fn lookup_stock(
    State(store): State<Arc<CatalogStore>>,
    Json(req): Json<LookupStockRequest>,
) -> Json<LookupStockResponse> {
    match store.lookup(&req.name).await {
        Some(stock) => Json(LookupStockResponse {
            exists: true,
            name: stock.name,
            price: stock.price,
            quantity: stock.quantity,
        }),
        None => Json(LookupStockResponse {
            exists: false,
            name: req.name,
            price: 0.0,
            quantity: 0,
        }),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub name: String,
    pub quantity_change: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStockResponse {
    pub success: bool,
    pub message: String,
    pub new_quantity: u64,
}

async fn update_stock(
    State(store): State<Arc<CatalogStore>>,
    Json(req): Json<UpdateStockRequest>,
) -> Json<UpdateStockResponse> {
    match store.update(&req.name, req.quantity_change).await {
        Ok(UpdateOutcome::Success { new_quantity }) => Json(UpdateStockResponse {
            success: true,
            message: "ok".to_string(),
            new_quantity,
        }),
        Ok(UpdateOutcome::NotFound) => Json(UpdateStockResponse {
            success: false,
            message: "stock not found".to_string(),
            new_quantity: 0,
        }),
        Ok(UpdateOutcome::Insufficient { current_quantity }) => Json(UpdateStockResponse {
            success: false,
            message: "insufficient stock".to_string(),
            new_quantity: current_quantity,
        }),
        Err(err) => {
            tracing::error!(name = %req.name, error = %err, "update_stock flush failed");
            Json(UpdateStockResponse {
                success: false,
                message: "internal error".to_string(),
                new_quantity: 0,
            })
        }
    }
}
