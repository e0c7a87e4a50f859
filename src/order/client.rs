use std::time::Duration;

use serde_json::json;

use crate::error::RpcError;

use super::model::{OrderRecord, OrderType};
use super::server::{
    HealthCheckResponse, LatestIdResponse, LookUpOrderResponse, LookUpOrdersByIdResponse,
    PlaceOrderResponse, SuccessMessageResponse,
};

/// Client for an Order replica's internal RPC surface (spec §4.2), used
/// by the frontend's replication coordinator.
#[derive(Clone)]
pub struct OrderClient {
    http: reqwest::Client,
    base_url: String,
}

impl OrderClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is static and valid");
        Self {
            http,
            base_url: format!("http://{}", address.into()),
        }
    }

    async fn post<B: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RpcError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(RpcError::from_reqwest)?;

        if !resp.status().is_success() {
            return Err(RpcError::Upstream(format!(
                "{path}: unexpected status {}",
                resp.status()
            )));
        }

        resp.json::<R>().await.map_err(RpcError::from_reqwest)
    }

    pub async fn place_order(
        &self,
        stock_name: &str,
        order_type: OrderType,
        quantity: u64,
    ) -> Result<PlaceOrderResponse, RpcError> {
        self.post(
            "/rpc/place-order",
            &json!({ "stock_name": stock_name, "order_type": order_type, "quantity": quantity }),
        )
        .await
    }

    pub async fn look_up_order(&self, transaction_id: i64) -> Result<LookUpOrderResponse, RpcError> {
        self.post(
            "/rpc/look-up-order",
            &json!({ "transaction_id": transaction_id }),
        )
        .await
    }

    pub async fn latest_id(&self) -> Result<LatestIdResponse, RpcError> {
        self.post("/rpc/latest-id", &json!({})).await
    }

    pub async fn look_up_orders_by_id(
        &self,
        transaction_id: i64,
    ) -> Result<LookUpOrdersByIdResponse, RpcError> {
        self.post(
            "/rpc/look-up-orders-by-id",
            &json!({ "transaction_id": transaction_id }),
        )
        .await
    }

    pub async fn sync_order(&self, record: &OrderRecord) -> Result<SuccessMessageResponse, RpcError> {
        self.post("/rpc/sync-order", record).await
    }

    pub async fn bulk_upsert(&self, data: &[OrderRecord]) -> Result<SuccessMessageResponse, RpcError> {
        self.post("/rpc/bulk-upsert", &json!({ "data": data })).await
    }

    pub async fn health_check(&self) -> Result<HealthCheckResponse, RpcError> {
        self.post("/rpc/health-check", &json!({})).await
    }
}
