//! Read-only surfaces over a view's reconciled cache.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use order_core::{
    fulfillment::{self, Completion},
    ledger,
    timer::{self, ElapsedLabel, UrgencyThresholds},
    OrderCache,
};
use shared::domain::{ItemId, KitchenId, Order, OrderId, OrderStatus, PaymentStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub remaining: f64,
    pub elapsed: ElapsedLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: OrderStatus,
    pub rows: Vec<BoardRow>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    pub thresholds: UrgencyThresholds,
}

impl OrderBoard {
    /// Visible orders, oldest first.
    pub fn rows(
        &self,
        cache: &OrderCache,
        pinned: &HashSet<OrderId>,
        now: DateTime<Utc>,
    ) -> Vec<BoardRow> {
        cache
            .visible(pinned)
            .into_iter()
            .map(|order| BoardRow {
                order_id: order.id,
                order_number: order.order_number.clone(),
                customer: order.customer.name.clone(),
                status: order.status,
                payment_status: order.payment_status,
                remaining: ledger::remaining(order),
                elapsed: timer::elapsed_label(timer::status_since(order), now, &self.thresholds),
            })
            .collect()
    }

    /// One column per status in lifecycle order, skipping empty ones.
    pub fn columns(
        &self,
        cache: &OrderCache,
        pinned: &HashSet<OrderId>,
        now: DateTime<Utc>,
    ) -> Vec<BoardColumn> {
        let rows = self.rows(cache, pinned, now);
        OrderStatus::ALL
            .into_iter()
            .filter_map(|status| {
                let rows: Vec<BoardRow> = rows
                    .iter()
                    .filter(|row| row.status == status)
                    .cloned()
                    .collect();
                (!rows.is_empty()).then_some(BoardColumn { status, rows })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KitchenTicket {
    pub order_id: OrderId,
    pub order_number: String,
    pub lines: Vec<TicketLine>,
    pub completion: Completion,
    pub elapsed: ElapsedLabel,
}

#[derive(Debug, Clone)]
pub struct KitchenBoard {
    pub kitchen_id: KitchenId,
    pub thresholds: UrgencyThresholds,
}

impl KitchenBoard {
    pub fn new(kitchen_id: KitchenId) -> Self {
        Self {
            kitchen_id,
            thresholds: UrgencyThresholds::default(),
        }
    }

    /// Tickets for active orders that still have work for this kitchen.
    pub fn tickets(&self, cache: &OrderCache, now: DateTime<Utc>) -> Vec<KitchenTicket> {
        let mut orders: Vec<&Order> = cache.active().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        orders
            .into_iter()
            .filter_map(|order| self.ticket(cache, order, now))
            .collect()
    }

    fn ticket(&self, cache: &OrderCache, order: &Order, now: DateTime<Utc>) -> Option<KitchenTicket> {
        let pending = fulfillment::project_for_kitchen(order, self.kitchen_id);
        if pending.is_empty() {
            return None;
        }
        let lines = pending
            .into_iter()
            .map(|item| TicketLine {
                item_id: item.id,
                name: cache.display_name(item).to_string(),
                quantity: item.quantity,
            })
            .collect();
        Some(KitchenTicket {
            order_id: order.id,
            order_number: order.order_number.clone(),
            lines,
            completion: fulfillment::kitchen_completion(order, self.kitchen_id),
            elapsed: timer::elapsed_label(order.created_at, now, &self.thresholds),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer: String,
    pub status: OrderStatus,
}

/// Lookup across every cached snapshot, terminal ones included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPanel;

impl SearchPanel {
    pub fn search(&self, cache: &OrderCache, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<SearchHit> = cache
            .orders()
            .filter(|order| matches_query(order, &needle))
            .map(|order| SearchHit {
                order_id: order.id,
                order_number: order.order_number.clone(),
                customer: order.customer.name.clone(),
                status: order.status,
            })
            .collect();
        hits.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        hits
    }
}

fn matches_query(order: &Order, needle: &str) -> bool {
    order.order_number.to_lowercase().contains(needle)
        || order.customer.name.to_lowercase().contains(needle)
        || order
            .customer
            .phone
            .as_deref()
            .is_some_and(|phone| phone.contains(needle))
}

#[cfg(test)]
#[path = "tests/adapters_tests.rs"]
mod tests;
