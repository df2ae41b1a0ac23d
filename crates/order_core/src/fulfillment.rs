//! Per-kitchen item preparation tracking.
//!
//! Fulfillment never moves `order.status`; a fully prepared order still
//! waits for the front of house to advance and settle it.

use std::collections::BTreeSet;

use shared::domain::{ItemId, ItemStatus, KitchenId, Order, OrderItem};

use crate::error::ValidationError;

/// Quantities are summed in `u64`, so many large lines cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub prepared_qty: u64,
    pub total_qty: u64,
}

impl Completion {
    /// Fraction of quantity prepared. An empty slice counts as complete.
    pub fn ratio(&self) -> f64 {
        if self.total_qty == 0 {
            1.0
        } else {
            self.prepared_qty as f64 / self.total_qty as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.prepared_qty >= self.total_qty
    }
}

/// Items of `order` still waiting on `kitchen_id`.
///
/// An empty result means the order does not belong on that kitchen's board.
pub fn project_for_kitchen(order: &Order, kitchen_id: KitchenId) -> Vec<&OrderItem> {
    order
        .items
        .iter()
        .filter(|item| item.kitchen_id == kitchen_id && !item.is_prepared())
        .collect()
}

pub fn kitchens_for_order(order: &Order) -> BTreeSet<KitchenId> {
    order.items.iter().map(|item| item.kitchen_id).collect()
}

pub fn set_item_status(
    order: &Order,
    item_id: ItemId,
    status: ItemStatus,
) -> Result<Order, ValidationError> {
    if order.item(item_id).is_none() {
        return Err(ValidationError::UnknownItem {
            order_id: order.id,
            item_id,
        });
    }
    let mut next = order.clone();
    for item in next.items.iter_mut().filter(|item| item.id == item_id) {
        item.status = status;
    }
    Ok(next)
}

pub fn mark_item_prepared(order: &Order, item_id: ItemId) -> Result<Order, ValidationError> {
    set_item_status(order, item_id, ItemStatus::Prepared)
}

/// Prepares every pending item of `kitchen_id` on a non-terminal order.
///
/// Returns `None` when nothing changed, so re-applying a broadcast is a no-op.
pub fn mark_all_for_kitchen_in(order: &Order, kitchen_id: KitchenId) -> Option<Order> {
    if order.status.is_terminal() || project_for_kitchen(order, kitchen_id).is_empty() {
        return None;
    }
    let mut next = order.clone();
    for item in next
        .items
        .iter_mut()
        .filter(|item| item.kitchen_id == kitchen_id)
    {
        item.status = ItemStatus::Prepared;
    }
    Some(next)
}

/// Fan-out of [`mark_all_for_kitchen_in`] across a set of orders.
///
/// Returns how many orders changed.
pub fn mark_all_for_kitchen<'a, I>(orders: I, kitchen_id: KitchenId) -> usize
where
    I: IntoIterator<Item = &'a mut Order>,
{
    let mut changed = 0;
    for order in orders {
        if let Some(next) = mark_all_for_kitchen_in(order, kitchen_id) {
            *order = next;
            changed += 1;
        }
    }
    changed
}

pub fn order_completion(order: &Order) -> Completion {
    completion_of(order.items.iter())
}

pub fn kitchen_completion(order: &Order, kitchen_id: KitchenId) -> Completion {
    completion_of(
        order
            .items
            .iter()
            .filter(|item| item.kitchen_id == kitchen_id),
    )
}

fn completion_of<'a>(items: impl Iterator<Item = &'a OrderItem>) -> Completion {
    items.fold(Completion::default(), |mut acc, item| {
        let quantity = u64::from(item.quantity);
        acc.total_qty = acc.total_qty.saturating_add(quantity);
        if item.is_prepared() {
            acc.prepared_qty = acc.prepared_qty.saturating_add(quantity);
        }
        acc
    })
}

#[cfg(test)]
#[path = "tests/fulfillment_tests.rs"]
mod tests;
