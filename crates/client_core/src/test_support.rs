use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use order_core::{fulfillment, ledger, state_machine};
use shared::{
    domain::{
        CustomerId, CustomerRef, DeliveryMethod, ItemId, ItemStatus, Kitchen, KitchenId, Order,
        OrderId, OrderItem, OrderStatus, PaymentStatus, ProductId, StatusHistoryEntry, StoreId,
    },
    protocol::PaymentRequest,
};
use tokio::sync::{Mutex, Notify};

use crate::{backend::OrderBackend, error::ClientError};

pub const GRILL: KitchenId = KitchenId(1);
pub const DRINKS: KitchenId = KitchenId(2);

pub fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

/// Subtotal 300: burgers (qty 2) on the grill and a soda at drinks.
pub fn order(id: i64, status: OrderStatus) -> Order {
    Order {
        id: OrderId(id),
        order_number: format!("A-{id:03}"),
        store_id: StoreId(1),
        status,
        delivery_method: DeliveryMethod::Delivery,
        customer: CustomerRef {
            customer_id: CustomerId(id),
            name: format!("Customer {id}"),
            phone: Some(format!("555-01{id:02}")),
        },
        items: vec![
            OrderItem {
                id: ItemId(1),
                product_id: ProductId(10),
                kitchen_id: GRILL,
                quantity: 2,
                name: "Burger".to_string(),
                status: ItemStatus::Pending,
            },
            OrderItem {
                id: ItemId(2),
                product_id: ProductId(20),
                kitchen_id: DRINKS,
                quantity: 1,
                name: "Soda".to_string(),
                status: ItemStatus::Pending,
            },
        ],
        payments: Vec::new(),
        payment_status: PaymentStatus::Unpaid,
        subtotal: 300.0,
        total: 300.0,
        status_history: vec![StatusHistoryEntry {
            status,
            timestamp: at(id),
        }],
        created_at: at(id),
        updated_at: at(id),
        cancel_reason: None,
    }
}

/// In-memory backend applying the same core rules as the real one.
#[derive(Default)]
pub struct FakeBackend {
    pub orders: Mutex<HashMap<OrderId, Order>>,
    pub calls: Mutex<Vec<String>>,
    pub conflict: bool,
    pub hold: Option<std::sync::Arc<Notify>>,
}

impl FakeBackend {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders.into_iter().map(|o| (o.id, o)).collect()),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, call: String) -> Result<(), ClientError> {
        self.calls.lock().await.push(call);
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        if self.conflict {
            return Err(ClientError::Conflict {
                status: 409,
                message: "finalized on another device".to_string(),
            });
        }
        Ok(())
    }

    async fn update(
        &self,
        order_id: OrderId,
        apply: impl FnOnce(&Order) -> Result<Order, order_core::ValidationError>,
    ) -> Result<Order, ClientError> {
        let mut orders = self.orders.lock().await;
        let current = orders.get(&order_id).ok_or(ClientError::Conflict {
            status: 404,
            message: "no such order".to_string(),
        })?;
        let next = apply(current).map_err(|err| ClientError::Conflict {
            status: 409,
            message: err.to_string(),
        })?;
        orders.insert(order_id, next.clone());
        Ok(next)
    }
}

#[async_trait]
impl OrderBackend for FakeBackend {
    async fn transition_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        self.enter(format!("transition {order_id} {status}")).await?;
        self.update(order_id, |o| state_machine::transition(o, status, at(30)))
            .await
    }

    async fn cancel_order(&self, order_id: OrderId, reason: &str) -> Result<Order, ClientError> {
        self.enter(format!("cancel {order_id}")).await?;
        self.update(order_id, |o| state_machine::cancel(o, reason, at(30)))
            .await
    }

    async fn register_payment(
        &self,
        order_id: OrderId,
        request: &PaymentRequest,
    ) -> Result<Order, ClientError> {
        self.enter(format!("payment {order_id} {}", request.amount))
            .await?;
        self.update(order_id, |o| ledger::register_payment(o, request, at(30)))
            .await
    }

    async fn fetch_active_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.enter("fetch_active_orders".to_string()).await?;
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| !o.is_terminal())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn fetch_kitchens(&self, store_id: StoreId) -> Result<Vec<Kitchen>, ClientError> {
        self.enter(format!("kitchens {store_id}")).await?;
        Ok(vec![Kitchen {
            id: GRILL,
            name: "Grill".to_string(),
            store_id,
        }])
    }

    async fn mark_item_status(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), ClientError> {
        self.enter(format!("item {order_id} {item_id}")).await?;
        self.update(order_id, |o| fulfillment::set_item_status(o, item_id, status))
            .await
            .map(|_| ())
    }

    async fn mark_all_prepared(&self, kitchen_id: KitchenId) -> Result<(), ClientError> {
        self.enter(format!("mark_all {kitchen_id}")).await?;
        let mut orders = self.orders.lock().await;
        fulfillment::mark_all_for_kitchen(orders.values_mut(), kitchen_id);
        Ok(())
    }
}
