//! Reconciliation of asynchronous push traffic into one view's order cache.
//!
//! Every view owns its own [`OrderCache`] and feeds it through [`merge`], the
//! only function allowed to write it. The rules:
//!
//! - **creation**: ignored when the id was ever seen, inserted otherwise.
//! - **update**: the incoming snapshot replaces the stored aggregate whole,
//!   or is inserted when absent. There is no field-level merge and no
//!   timestamp ordering; a stale snapshot processed last wins.
//! - **kitchen broadcast**: every pending item of that kitchen on every
//!   non-terminal cached order becomes prepared.
//! - **catalog updates** land in a side directory and only affect display
//!   names.
//!
//! Each call runs to completion; a message is either fully applied or not
//! applied at all.

use std::collections::{HashMap, HashSet};

use shared::{
    domain::{KitchenId, Order, OrderId, OrderItem, Product, ProductId, Store},
    protocol::ServerEvent,
};
use tracing::debug;

use crate::fulfillment;

/// A tagged inbound message, queued by the transport and drained by the view.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    Created(Order),
    Updated(Order),
    KitchenBroadcast(KitchenId),
    ProductUpdated(Product),
    StoreUpdated(Store),
}

impl PushMessage {
    /// Maps a wire event to a mergeable message. Error events carry nothing
    /// to merge and map to `None`.
    pub fn from_event(event: ServerEvent) -> Option<Self> {
        match event {
            ServerEvent::OrderCreated { order } => Some(Self::Created(order)),
            ServerEvent::OrderUpdated { order } => Some(Self::Updated(order)),
            ServerEvent::KitchenMarkAllPrepared { kitchen_id } => {
                Some(Self::KitchenBroadcast(kitchen_id))
            }
            ServerEvent::ProductUpdated { product } => Some(Self::ProductUpdated(product)),
            ServerEvent::StoreUpdated { store } => Some(Self::StoreUpdated(store)),
            ServerEvent::Error(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::KitchenBroadcast(_) => "kitchen_broadcast",
            Self::ProductUpdated(_) => "product_updated",
            Self::StoreUpdated(_) => "store_updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted(OrderId),
    Replaced(OrderId),
    /// The incoming snapshot equals the stored one.
    Unchanged(OrderId),
    /// Duplicate creation.
    Ignored(OrderId),
    KitchenPrepared {
        kitchen_id: KitchenId,
        orders: usize,
    },
    CatalogUpdated,
}

impl MergeOutcome {
    pub fn changed_cache(&self) -> bool {
        match self {
            Self::Inserted(_) | Self::Replaced(_) | Self::CatalogUpdated => true,
            Self::KitchenPrepared { orders, .. } => *orders > 0,
            Self::Unchanged(_) | Self::Ignored(_) => false,
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Inserted(id) | Self::Replaced(id) | Self::Unchanged(id) | Self::Ignored(id) => {
                Some(*id)
            }
            Self::KitchenPrepared { .. } | Self::CatalogUpdated => None,
        }
    }
}

/// One view's reconciled snapshots plus the catalog used for display names.
///
/// `seen` holds every order id the cache has accepted, evicted ones
/// included, and is never pruned: a late `order.created` for an evicted
/// order must stay ignored. It grows by one id per distinct order the view
/// observes over its lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderCache {
    orders: HashMap<OrderId, Order>,
    seen: HashSet<OrderId>,
    products: HashMap<ProductId, Product>,
    store: Option<Store>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, message: PushMessage) -> MergeOutcome {
        merge(self, message)
    }

    /// Upserts the result of an initial fetch.
    pub fn seed(&mut self, orders: impl IntoIterator<Item = Order>) -> Vec<MergeOutcome> {
        orders
            .into_iter()
            .map(|order| self.merge(PushMessage::Updated(order)))
            .collect()
    }

    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.contains_key(&order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Non-terminal snapshots.
    pub fn active(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|order| !order.is_terminal())
    }

    /// The visible working set: active orders plus any pinned by an open
    /// detail panel, oldest first.
    pub fn visible(&self, pinned: &HashSet<OrderId>) -> Vec<&Order> {
        let mut visible: Vec<&Order> = self
            .orders
            .values()
            .filter(|order| !order.is_terminal() || pinned.contains(&order.id))
            .collect();
        visible.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        visible
    }

    /// Drops terminal snapshots nobody pinned. Their ids stay remembered so a
    /// late duplicate creation cannot resurrect them.
    pub fn evict_terminal(&mut self, pinned: &HashSet<OrderId>) -> Vec<OrderId> {
        let evicted: Vec<OrderId> = self
            .orders
            .values()
            .filter(|order| order.is_terminal() && !pinned.contains(&order.id))
            .map(|order| order.id)
            .collect();
        for order_id in &evicted {
            self.orders.remove(order_id);
        }
        evicted
    }

    pub fn product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.get(&product_id)
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    /// Catalog name when known, otherwise the name captured on the order.
    pub fn display_name<'a>(&'a self, item: &'a OrderItem) -> &'a str {
        self.products
            .get(&item.product_id)
            .map(|product| product.name.as_str())
            .unwrap_or(item.name.as_str())
    }

    fn apply_created(&mut self, order: Order) -> MergeOutcome {
        let order_id = order.id;
        if !self.seen.insert(order_id) {
            debug!(order_id = order_id.0, "reconcile: duplicate creation ignored");
            return MergeOutcome::Ignored(order_id);
        }
        self.orders.insert(order_id, order);
        MergeOutcome::Inserted(order_id)
    }

    fn apply_updated(&mut self, order: Order) -> MergeOutcome {
        let order_id = order.id;
        self.seen.insert(order_id);
        match self.orders.get_mut(&order_id) {
            Some(existing) if *existing == order => MergeOutcome::Unchanged(order_id),
            Some(existing) => {
                if order.updated_at < existing.updated_at {
                    debug!(
                        order_id = order_id.0,
                        "reconcile: older snapshot replaces newer one"
                    );
                }
                *existing = order;
                MergeOutcome::Replaced(order_id)
            }
            None => {
                self.orders.insert(order_id, order);
                MergeOutcome::Inserted(order_id)
            }
        }
    }

    fn apply_kitchen_broadcast(&mut self, kitchen_id: KitchenId) -> MergeOutcome {
        let orders = fulfillment::mark_all_for_kitchen(self.orders.values_mut(), kitchen_id);
        MergeOutcome::KitchenPrepared { kitchen_id, orders }
    }
}

/// The single merge rule shared by every view.
pub fn merge(cache: &mut OrderCache, message: PushMessage) -> MergeOutcome {
    match message {
        PushMessage::Created(order) => cache.apply_created(order),
        PushMessage::Updated(order) => cache.apply_updated(order),
        PushMessage::KitchenBroadcast(kitchen_id) => cache.apply_kitchen_broadcast(kitchen_id),
        PushMessage::ProductUpdated(product) => {
            cache.products.insert(product.id, product);
            MergeOutcome::CatalogUpdated
        }
        PushMessage::StoreUpdated(store) => {
            cache.store = Some(store);
            MergeOutcome::CatalogUpdated
        }
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
