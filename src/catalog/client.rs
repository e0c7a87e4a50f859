use std::time::Duration;

use serde_json::json;

use crate::error::RpcError;

use super::server::{LookupStockResponse, UpdateStockResponse};

/// Client for the Catalog's internal RPC surface, used by the Order
/// replica's `PlaceOrder` handler (spec §4.2 step a-c).
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
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

    pub async fn lookup_stock(&self, name: &str) -> Result<LookupStockResponse, RpcError> {
        let resp = self
            .http
            .post(format!("{}/rpc/lookup-stock", self.base_url))
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(RpcError::from_reqwest)?;

        if !resp.status().is_success() {
            return Err(RpcError::Upstream(format!(
                "lookup_stock: unexpected status {}",
                resp.status()
            )));
        }

        resp.json::<LookupStockResponse>()
            .await
            .map_err(RpcError::from_reqwest)
    }

    pub async fn update_stock(
        &self,
        name: &str,
        quantity_change: i64,
    ) -> Result<UpdateStockResponse, RpcError> {
        let resp = self
            .http
            .post(format!("{}/rpc/update-stock", self.base_url))
            .json(&json!({ "name": name, "quantity_change": quantity_change }))
            .send()
            .await
            .map_err(RpcError::from_reqwest)?;

        if !resp.status().is_success() {
            return Err(RpcError::Upstream(format!(
                "update_stock: unexpected status {}",
                resp.status()
            )));
        }

        resp.json::<UpdateStockResponse>()
            .await
            .map_err(RpcError::from_reqwest)
    }
}
