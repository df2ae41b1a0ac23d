use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use order_core::{fulfillment, ledger, state_machine, ValidationError};
use shared::{
    domain::{
        ItemId, ItemStatus, Kitchen, KitchenId, Order, OrderId, OrderItem, OrderStatus,
        PaymentStatus, StatusHistoryEntry, StoreId,
    },
    error::ApiError,
    protocol::{PaymentRequest, PlaceOrderRequest},
};
use tokio::sync::RwLock;

/// The authoritative order aggregate, held in memory.
#[derive(Clone)]
pub struct ApiContext {
    pub store_id: StoreId,
    pub kitchens: Vec<Kitchen>,
    orders: Arc<RwLock<OrderBook>>,
}

#[derive(Default)]
struct OrderBook {
    orders: BTreeMap<OrderId, Order>,
    next_order_id: i64,
    next_item_id: i64,
}

impl ApiContext {
    pub fn new(store_id: StoreId, kitchens: Vec<Kitchen>) -> Self {
        Self {
            store_id,
            kitchens,
            orders: Arc::new(RwLock::new(OrderBook::default())),
        }
    }

    fn kitchen(&self, kitchen_id: KitchenId) -> Option<&Kitchen> {
        self.kitchens.iter().find(|kitchen| kitchen.id == kitchen_id)
    }
}

pub async fn list_active_orders(ctx: &ApiContext) -> Vec<Order> {
    ctx.orders
        .read()
        .await
        .orders
        .values()
        .filter(|order| !order.is_terminal())
        .cloned()
        .collect()
}

pub async fn get_order(ctx: &ApiContext, order_id: OrderId) -> Result<Order, ApiError> {
    ctx.orders
        .read()
        .await
        .orders
        .get(&order_id)
        .cloned()
        .ok_or_else(|| order_not_found(order_id))
}

/// Creates an order in `pending` from a placement request.
pub async fn place_order(
    ctx: &ApiContext,
    request: PlaceOrderRequest,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    if request.store_id != ctx.store_id {
        return Err(ApiError::not_found(format!(
            "store {} not found",
            request.store_id
        )));
    }
    if request.lines.is_empty() {
        return Err(ApiError::validation("an order needs at least one line"));
    }
    if !request.delivery_fee.is_finite() || request.delivery_fee < 0.0 {
        return Err(ApiError::validation("delivery_fee must be a non-negative number"));
    }
    for line in &request.lines {
        if line.quantity == 0 {
            return Err(ApiError::validation(format!(
                "line {} has zero quantity",
                line.name
            )));
        }
        if !line.unit_price.is_finite() || line.unit_price < 0.0 {
            return Err(ApiError::validation(format!(
                "line {} has an invalid unit price",
                line.name
            )));
        }
        if ctx.kitchen(line.kitchen_id).is_none() {
            return Err(ApiError::not_found(format!(
                "kitchen {} not found",
                line.kitchen_id
            )));
        }
    }

    let subtotal: f64 = request
        .lines
        .iter()
        .map(|line| f64::from(line.quantity) * line.unit_price)
        .sum();

    let mut book = ctx.orders.write().await;
    book.next_order_id += 1;
    let order_id = OrderId(book.next_order_id);
    let mut items = Vec::with_capacity(request.lines.len());
    for line in request.lines {
        book.next_item_id += 1;
        items.push(OrderItem {
            id: ItemId(book.next_item_id),
            product_id: line.product_id,
            kitchen_id: line.kitchen_id,
            quantity: line.quantity,
            name: line.name,
            status: ItemStatus::Pending,
        });
    }
    let order = Order {
        id: order_id,
        order_number: format!("{:04}", order_id.0),
        store_id: request.store_id,
        status: OrderStatus::Pending,
        delivery_method: request.delivery_method,
        customer: request.customer,
        items,
        payments: Vec::new(),
        payment_status: PaymentStatus::Unpaid,
        subtotal,
        total: subtotal + request.delivery_fee,
        status_history: vec![StatusHistoryEntry {
            status: OrderStatus::Pending,
            timestamp: now,
        }],
        created_at: now,
        updated_at: now,
        cancel_reason: None,
    };
    book.orders.insert(order_id, order.clone());
    Ok(order)
}

pub async fn transition_order(
    ctx: &ApiContext,
    order_id: OrderId,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    update(ctx, order_id, |order| {
        state_machine::transition(order, status, now)
    })
    .await
}

pub async fn cancel_order(
    ctx: &ApiContext,
    order_id: OrderId,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    update(ctx, order_id, |order| state_machine::cancel(order, reason, now)).await
}

pub async fn register_payment(
    ctx: &ApiContext,
    order_id: OrderId,
    request: &PaymentRequest,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    update(ctx, order_id, |order| {
        ledger::register_payment(order, request, now)
    })
    .await
}

pub async fn set_item_status(
    ctx: &ApiContext,
    order_id: OrderId,
    item_id: ItemId,
    status: ItemStatus,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    update(ctx, order_id, |order| {
        if order.is_terminal() {
            return Err(ValidationError::OrderTerminal {
                order_id: order.id,
                status: order.status,
            });
        }
        let mut next = fulfillment::set_item_status(order, item_id, status)?;
        if next != *order {
            next.updated_at = now;
        }
        Ok(next)
    })
    .await
}

pub async fn list_kitchens(ctx: &ApiContext, store_id: StoreId) -> Result<Vec<Kitchen>, ApiError> {
    if store_id != ctx.store_id {
        return Err(ApiError::not_found(format!("store {store_id} not found")));
    }
    Ok(ctx.kitchens.clone())
}

/// Prepares every pending item of `kitchen_id` on every active order and
/// returns the orders that changed.
pub async fn mark_all_prepared(
    ctx: &ApiContext,
    kitchen_id: KitchenId,
    now: DateTime<Utc>,
) -> Result<Vec<Order>, ApiError> {
    if ctx.kitchen(kitchen_id).is_none() {
        return Err(ApiError::not_found(format!("kitchen {kitchen_id} not found")));
    }
    let mut book = ctx.orders.write().await;
    let mut changed = Vec::new();
    for order in book.orders.values_mut() {
        if let Some(mut next) = fulfillment::mark_all_for_kitchen_in(order, kitchen_id) {
            next.updated_at = now;
            *order = next;
            changed.push(order.clone());
        }
    }
    Ok(changed)
}

async fn update<F>(ctx: &ApiContext, order_id: OrderId, apply: F) -> Result<Order, ApiError>
where
    F: FnOnce(&Order) -> Result<Order, ValidationError>,
{
    let mut book = ctx.orders.write().await;
    let current = book
        .orders
        .get(&order_id)
        .ok_or_else(|| order_not_found(order_id))?;
    let next = apply(current).map_err(rejection)?;
    book.orders.insert(order_id, next.clone());
    Ok(next)
}

/// Malformed input is a validation failure; anything else means the caller
/// acted on an older snapshot.
pub fn rejection(err: ValidationError) -> ApiError {
    let message = err.to_string();
    match err {
        ValidationError::MissingCancelReason
        | ValidationError::NonPositiveAmount { .. }
        | ValidationError::InvalidTip { .. }
        | ValidationError::NonFinite { .. } => ApiError::validation(message),
        ValidationError::UnknownItem { .. } => ApiError::not_found(message),
        ValidationError::OrderTerminal { .. }
        | ValidationError::IllegalTransition { .. }
        | ValidationError::NotFullyPaid { .. }
        | ValidationError::AlreadyPaid { .. }
        | ValidationError::ExceedsRemaining { .. } => ApiError::conflict(message),
    }
}

fn order_not_found(order_id: OrderId) -> ApiError {
    ApiError::not_found(format!("order {order_id} not found"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
