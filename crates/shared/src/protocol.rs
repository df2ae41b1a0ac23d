use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        CustomerRef, DeliveryMethod, ItemStatus, KitchenId, Order, OrderStatus, PaymentMethod,
        Product, ProductId, Store, StoreId,
    },
    error::ApiError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
}

/// Body of `registerPayment`. The server derives `change_given` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: f64,
    #[serde(default)]
    pub tip: f64,
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_received: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStatusRequest {
    pub status: ItemStatus,
}

/// Placement payload from the external order-placement system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub store_id: StoreId,
    pub delivery_method: DeliveryMethod,
    pub customer: CustomerRef,
    pub lines: Vec<PlaceOrderLine>,
    #[serde(default)]
    pub delivery_fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderLine {
    pub product_id: ProductId,
    pub kitchen_id: KitchenId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Push envelope delivered over the websocket stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "order.created")]
    OrderCreated { order: Order },
    #[serde(rename = "order.updated")]
    OrderUpdated { order: Order },
    #[serde(rename = "kitchen.mark_all_prepared")]
    KitchenMarkAllPrepared { kitchen_id: KitchenId },
    #[serde(rename = "product.updated")]
    ProductUpdated { product: Product },
    #[serde(rename = "store.updated")]
    StoreUpdated { store: Store },
    #[serde(rename = "error")]
    Error(ApiError),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "order.created",
            Self::OrderUpdated { .. } => "order.updated",
            Self::KitchenMarkAllPrepared { .. } => "kitchen.mark_all_prepared",
            Self::ProductUpdated { .. } => "product.updated",
            Self::StoreUpdated { .. } => "store.updated",
            Self::Error(_) => "error",
        }
    }
}
