use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ItemId, ItemStatus, Kitchen, KitchenId, Order, OrderId, OrderStatus, StoreId},
    error::ApiError,
    protocol::{
        CancelOrderRequest, ItemStatusRequest, PaymentRequest, PlaceOrderRequest,
        TransitionStatusRequest,
    },
};
use tracing::warn;

use crate::error::ClientError;

/// Request/response operations against the authoritative backend.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn transition_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ClientError>;
    async fn cancel_order(&self, order_id: OrderId, reason: &str) -> Result<Order, ClientError>;
    async fn register_payment(
        &self,
        order_id: OrderId,
        request: &PaymentRequest,
    ) -> Result<Order, ClientError>;
    async fn fetch_active_orders(&self) -> Result<Vec<Order>, ClientError>;
    async fn fetch_kitchens(&self, store_id: StoreId) -> Result<Vec<Kitchen>, ClientError>;
    /// Fire-and-forget. The resulting state arrives as a push update.
    async fn mark_item_status(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), ClientError>;
    /// Asks the backend to broadcast a kitchen-wide "mark all prepared".
    async fn mark_all_prepared(&self, kitchen_id: KitchenId) -> Result<(), ClientError>;
}

pub struct HttpOrderBackend {
    http: Client,
    server_url: String,
}

impl HttpOrderBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Placement route used by the order-placement system and demo tooling.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> Result<Order, ClientError> {
        let response = self
            .http
            .post(format!("{}/orders", self.server_url))
            .json(request)
            .send()
            .await?;
        decode_json(response).await
    }
}

#[async_trait]
impl OrderBackend for HttpOrderBackend {
    async fn transition_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        let response = self
            .http
            .post(format!("{}/orders/{}/status", self.server_url, order_id.0))
            .json(&TransitionStatusRequest { status })
            .send()
            .await?;
        decode_json(response).await
    }

    async fn cancel_order(&self, order_id: OrderId, reason: &str) -> Result<Order, ClientError> {
        let response = self
            .http
            .post(format!("{}/orders/{}/cancel", self.server_url, order_id.0))
            .json(&CancelOrderRequest {
                reason: reason.to_string(),
            })
            .send()
            .await?;
        decode_json(response).await
    }

    async fn register_payment(
        &self,
        order_id: OrderId,
        request: &PaymentRequest,
    ) -> Result<Order, ClientError> {
        let response = self
            .http
            .post(format!("{}/orders/{}/payments", self.server_url, order_id.0))
            .json(request)
            .send()
            .await?;
        decode_json(response).await
    }

    async fn fetch_active_orders(&self) -> Result<Vec<Order>, ClientError> {
        let response = self
            .http
            .get(format!("{}/orders/active", self.server_url))
            .send()
            .await?;
        decode_json(response).await
    }

    async fn fetch_kitchens(&self, store_id: StoreId) -> Result<Vec<Kitchen>, ClientError> {
        let response = self
            .http
            .get(format!("{}/stores/{}/kitchens", self.server_url, store_id.0))
            .send()
            .await?;
        decode_json(response).await
    }

    async fn mark_item_status(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/orders/{}/items/{}/status",
                self.server_url, order_id.0, item_id.0
            ))
            .json(&ItemStatusRequest { status })
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn mark_all_prepared(&self, kitchen_id: KitchenId) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/kitchens/{}/mark-all-prepared",
                self.server_url, kitchen_id.0
            ))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|err| ClientError::Transport(format!("invalid response body: {err}")))
}

/// 409 and 404 mean the backend's state diverged from ours; everything else
/// unsuccessful is a transport failure.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|api| api.message)
        .unwrap_or(body);
    match status {
        StatusCode::CONFLICT | StatusCode::NOT_FOUND => Err(ClientError::Conflict {
            status: status.as_u16(),
            message,
        }),
        _ => {
            warn!(status = status.as_u16(), %message, "backend: unexpected response");
            Err(ClientError::Transport(format!(
                "unexpected status {}: {message}",
                status.as_u16()
            )))
        }
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
