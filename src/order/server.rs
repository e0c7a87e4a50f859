use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogClient;

use super::model::{OrderRecord, OrderType};
use super::store::OrderStore;

#[derive(Clone)]
pub struct OrderServerState {
    pub store: Arc<OrderStore>,
    pub catalog: CatalogClient,
}

/// Internal RPC surface for an Order replica (spec §4.2, §6: port
/// `50053 + replica_id`). Plain HTTP+JSON — see `DESIGN.md`.
pub fn router(state: OrderServerState) -> Router {
    Router::new()
        .route("/rpc/place-order", post(place_order))
        .route("/rpc/look-up-order", post(look_up_order))
        .route("/rpc/latest-id", post(latest_id))
        .route("/rpc/look-up-orders-by-id", post(look_up_orders_by_id))
        .route("/rpc/sync-order", post(sync_order))
        .route("/rpc/bulk-upsert", post(bulk_upsert))
        .route("/rpc/health-check", post(health_check))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub stock_name: String,
    pub order_type: OrderType,
    pub quantity: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: i64,
}

/// Spec §4.2 `PlaceOrder`: the Catalog round trip happens with the order
/// log lock released (§5); only the id assignment and append take the
/// write lock, and that section is atomic with SyncOrder/BulkUpsert.
async fn place_order(
    State(state): State<OrderServerState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Json<PlaceOrderResponse> {
    let lookup = match state.catalog.lookup_stock(&req.stock_name).await {
        Ok(resp) => resp,
        Err(err) => {
            tracing::error!(stock = %req.stock_name, error = %err, "place_order: catalog lookup failed");
            return Json(PlaceOrderResponse {
                success: false,
                message: format!("catalog unavailable: {err}"),
                transaction_id: -1,
            });
        }
    };

    if !lookup.exists {
        return Json(PlaceOrderResponse {
            success: false,
            message: "Stock not found".to_string(),
            transaction_id: -1,
        });
    }

    if req.order_type == OrderType::Buy && lookup.quantity < req.quantity {
        return Json(PlaceOrderResponse {
            success: false,
            message: "Insufficient stock".to_string(),
            transaction_id: -1,
        });
    }

    let quantity_change = req.order_type.catalog_delta(req.quantity);
    let update = match state
        .catalog
        .update_stock(&req.stock_name, quantity_change)
        .await
    {
        Ok(resp) => resp,
        Err(err) => {
            tracing::error!(stock = %req.stock_name, error = %err, "place_order: catalog update failed");
            return Json(PlaceOrderResponse {
                success: false,
                message: format!("catalog unavailable: {err}"),
                transaction_id: -1,
            });
        }
    };

    if !update.success {
        return Json(PlaceOrderResponse {
            success: false,
            message: update.message,
            transaction_id: -1,
        });
    }

    match state
        .store
        .append_new(req.stock_name, req.order_type, req.quantity)
        .await
    {
        Ok(record) => Json(PlaceOrderResponse {
            success: true,
            message: "order placed".to_string(),
            transaction_id: record.transaction_id,
        }),
        Err(err) => {
            tracing::error!(error = %err, "place_order: order log flush failed");
            Json(PlaceOrderResponse {
                success: false,
                message: "internal error".to_string(),
                transaction_id: -1,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionIdRequest {
    pub transaction_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookUpOrderResponse {
    pub exists: bool,
    pub transaction_id: i64,
    pub stock_name: String,
    pub order_type: Option<OrderType>,
    pub quantity: u64,
    pub message: String,
}

async fn look_up_order(
    State(state): State<OrderServerState>,
    Json(req): Json<TransactionIdRequest>,
) -> Json<LookUpOrderResponse> {
    match state.store.lookup(req.transaction_id).await {
        Some(record) => Json(LookUpOrderResponse {
            exists: true,
            transaction_id: record.transaction_id,
            stock_name: record.stock_name,
            order_type: Some(record.order_type),
            quantity: record.quantity,
            message: String::new(),
        }),
        None => Json(LookUpOrderResponse {
            exists: false,
            transaction_id: req.transaction_id,
            stock_name: String::new(),
            order_type: None,
            quantity: 0,
            message: "Order not found".to_string(),
        }),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LatestIdResponse {
    pub success: bool,
    pub transaction_id: i64,
}

async fn latest_id(State(state): State<OrderServerState>) -> Json<LatestIdResponse> {
    Json(LatestIdResponse {
        success: true,
        transaction_id: state.store.next_id().await,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookUpOrdersByIdResponse {
    pub exists: bool,
    pub data: Vec<OrderRecord>,
    pub message: String,
}

async fn look_up_orders_by_id(
    State(state): State<OrderServerState>,
    Json(req): Json<TransactionIdRequest>,
) -> Json<LookUpOrdersByIdResponse> {
    let data = state.store.orders_after(req.transaction_id).await;
    if data.is_empty() {
        Json(LookUpOrdersByIdResponse {
            exists: false,
            data,
            message: format!("No new order present after {}", req.transaction_id),
        })
    } else {
        Json(LookUpOrdersByIdResponse {
            exists: true,
            data,
            message: String::new(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessMessageResponse {
    pub success: bool,
    pub message: String,
}

async fn sync_order(
    State(state): State<OrderServerState>,
    Json(record): Json<OrderRecord>,
) -> Json<SuccessMessageResponse> {
    let replica_id = state.store.replica_id;
    match state.store.sync_order(record).await {
        Ok(true) => Json(SuccessMessageResponse {
            success: true,
            message: format!("Order Replica {replica_id} synced successfully"),
        }),
        Ok(false) => Json(SuccessMessageResponse {
            success: true,
            message: "already in sync".to_string(),
        }),
        Err(err) => {
            tracing::error!(error = %err, "sync_order flush failed");
            Json(SuccessMessageResponse {
                success: false,
                message: format!("flush failed: {err}"),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkUpsertRequest {
    pub data: Vec<OrderRecord>,
}

async fn bulk_upsert(
    State(state): State<OrderServerState>,
    Json(req): Json<BulkUpsertRequest>,
) -> Json<SuccessMessageResponse> {
    let replica_id = state.store.replica_id;
    match state.store.bulk_upsert(req.data).await {
        Ok(()) => Json(SuccessMessageResponse {
            success: true,
            message: format!("Replica {replica_id} updated successfully"),
        }),
        Err(err) => {
            tracing::error!(error = %err, "bulk_upsert flush failed");
            Json(SuccessMessageResponse {
                success: false,
                message: format!("flush failed: {err}"),
            })
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub success: bool,
}

async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse { success: true })
}
