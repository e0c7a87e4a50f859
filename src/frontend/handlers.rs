use axum::extract::{Path, State};

use super::server::AppState;
use super::types::{
    ApiError, ApiResponse, AppJson, OrderView, PlaceOrderBody, PlaceOrderView, StockView,
};

/// `GET /stocks/{name}` (spec §6). Cache → on miss, Catalog → cache
/// insert → reply.
pub async fn get_stock(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResponse<StockView> {
    if let Some(cached) = state.cache.get(&name).await {
        return ApiResponse::Ok(StockView {
            name: cached.name,
            price: cached.price,
            quantity: cached.quantity,
        });
    }

    match state.catalog.lookup_stock(&name).await {
        Ok(resp) if resp.exists => {
            state
                .cache
                .put(super::cache::CachedStock {
                    name: resp.name.clone(),
                    price: resp.price,
                    quantity: resp.quantity,
                })
                .await;
            ApiResponse::Ok(StockView {
                name: resp.name,
                price: resp.price,
                quantity: resp.quantity,
            })
        }
        Ok(_) => ApiResponse::Err(ApiError::not_found(format!("stock {name} not found"))),
        Err(err) => {
            tracing::error!(%name, error = %err, "get_stock: catalog lookup failed");
            ApiResponse::Err(ApiError::internal("catalog unavailable"))
        }
    }
}

/// `POST /orders` (spec §6, §4.3 "Order placement coordination").
pub async fn place_order(
    State(state): State<AppState>,
    AppJson(body): AppJson<PlaceOrderBody>,
) -> ApiResponse<PlaceOrderView> {
    if body.quantity <= 0 {
        return ApiResponse::Err(ApiError::bad_request("quantity must be a positive integer"));
    }
    let quantity = body.quantity as u64;

    let (_leader_id, resp) = match state
        .coordinator
        .place_order(&body.name, body.order_type, quantity)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(name = %body.name, error = %err, "place_order failed");
            return ApiResponse::Err(ApiError::internal("order service unavailable"));
        }
    };

    if !resp.success {
        return ApiResponse::Err(classify_place_order_failure(&resp.message));
    }

    // Invalidation happens-before the HTTP 200 (spec §5 ordering).
    state.cache.invalidate(&body.name).await;

    let record = crate::order::OrderRecord {
        transaction_id: resp.transaction_id,
        stock_name: body.name,
        order_type: body.order_type,
        quantity,
    };
    state.coordinator.sync_to_followers(&record).await;

    ApiResponse::Ok(PlaceOrderView {
        transaction_id: resp.transaction_id,
    })
}

fn classify_place_order_failure(message: &str) -> ApiError {
    if message.eq_ignore_ascii_case("stock not found") {
        ApiError::not_found(message.to_string())
    } else if message.eq_ignore_ascii_case("insufficient stock") {
        ApiError::bad_request(message.to_string())
    } else {
        ApiError::internal(message.to_string())
    }
}

/// `GET /orders/{tid}` (spec §6).
pub async fn look_up_order(
    State(state): State<AppState>,
    Path(tid_raw): Path<String>,
) -> ApiResponse<OrderView> {
    let transaction_id: i64 = match tid_raw.parse() {
        Ok(id) => id,
        Err(_) => return ApiResponse::Err(ApiError::bad_request("order id must be an integer")),
    };

    match state.coordinator.look_up_order(transaction_id).await {
        Ok(resp) if resp.exists => ApiResponse::Ok(OrderView {
            transaction_id: resp.transaction_id,
            name: resp.stock_name,
            order_type: resp.order_type.expect("exists implies order_type is set"),
            quantity: resp.quantity,
        }),
        Ok(resp) => ApiResponse::Err(ApiError::not_found(if resp.message.is_empty() {
            "order not found".to_string()
        } else {
            resp.message
        })),
        Err(err) => {
            tracing::error!(transaction_id, error = %err, "look_up_order failed");
            ApiResponse::Err(ApiError::internal("order service unavailable"))
        }
    }
}
