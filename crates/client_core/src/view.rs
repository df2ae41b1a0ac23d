//! One view's runtime: its cache, its queue and its outbound calls.
//!
//! A view is the only writer of its [`OrderCache`]. Push messages queue up
//! in the subscription and are merged when the view drains them; results
//! of its own requests go through the same merge. Local preconditions are
//! checked against the cached snapshot before anything is sent.

use std::{collections::HashSet, future::Future, sync::Arc};

use chrono::Utc;
use order_core::{fulfillment, ledger, state_machine, MergeOutcome, OrderCache, PushMessage};
use shared::{
    domain::{ItemId, ItemStatus, Kitchen, KitchenId, Order, OrderId, OrderStatus, StoreId},
    protocol::PaymentRequest,
};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    backend::OrderBackend,
    connection::{ConnectionManager, SubscriptionId},
    error::ClientError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    OrderBoard,
    Kitchen(KitchenId),
    Search,
}

/// Closes a view from outside its own task, e.g. while a call is in flight.
#[derive(Clone)]
pub struct ViewCloser {
    closed: CancellationToken,
    connection: Arc<ConnectionManager>,
    subscription: SubscriptionId,
}

impl ViewCloser {
    /// Cancels in-flight calls, then drops the view's subscription so no
    /// further pushes are queued for it.
    pub async fn close(&self) {
        self.closed.cancel();
        self.connection.unsubscribe(self.subscription).await;
    }
}

pub struct OrderView {
    kind: ViewKind,
    backend: Arc<dyn OrderBackend>,
    connection: Arc<ConnectionManager>,
    subscription: SubscriptionId,
    inbox: mpsc::UnboundedReceiver<PushMessage>,
    cache: OrderCache,
    pinned: HashSet<OrderId>,
    closed: CancellationToken,
}

impl OrderView {
    pub async fn open(
        kind: ViewKind,
        backend: Arc<dyn OrderBackend>,
        connection: Arc<ConnectionManager>,
    ) -> Self {
        let subscription = connection.subscribe().await;
        info!(?kind, subscription = subscription.id.0, "view: opened");
        Self {
            kind,
            backend,
            connection,
            subscription: subscription.id,
            inbox: subscription.receiver,
            cache: OrderCache::new(),
            pinned: HashSet::new(),
            closed: CancellationToken::new(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn cache(&self) -> &OrderCache {
        &self.cache
    }

    pub fn pinned(&self) -> &HashSet<OrderId> {
        &self.pinned
    }

    /// Active orders plus pinned ones, oldest first.
    pub fn visible(&self) -> Vec<&Order> {
        self.cache.visible(&self.pinned)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub fn closer(&self) -> ViewCloser {
        ViewCloser {
            closed: self.closed.clone(),
            connection: Arc::clone(&self.connection),
            subscription: self.subscription,
        }
    }

    /// Initial fetch. Returns how many orders the backend reported.
    pub async fn load(&mut self) -> Result<usize, ClientError> {
        let orders = self.call(self.backend.fetch_active_orders()).await?;
        let count = orders.len();
        self.cache.seed(orders);
        self.cache.evict_terminal(&self.pinned);
        debug!(count, "view: loaded active orders");
        Ok(count)
    }

    pub async fn kitchens(&self, store_id: StoreId) -> Result<Vec<Kitchen>, ClientError> {
        self.call(self.backend.fetch_kitchens(store_id)).await
    }

    /// Merges every queued message without waiting for more.
    pub fn drain(&mut self) -> Result<Vec<MergeOutcome>, ClientError> {
        self.ensure_open()?;
        let mut outcomes = Vec::new();
        loop {
            match self.inbox.try_recv() {
                Ok(message) => outcomes.push(self.apply(message)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.cache.evict_terminal(&self.pinned);
        Ok(outcomes)
    }

    /// Waits for one message and merges it. `None` once the view is closed
    /// or the connection went away.
    pub async fn recv(&mut self) -> Option<MergeOutcome> {
        let message = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return None,
            message = self.inbox.recv() => message?,
        };
        let outcome = self.apply(message);
        self.cache.evict_terminal(&self.pinned);
        Some(outcome)
    }

    pub async fn transition(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        let current = self.snapshot(order_id)?;
        let checked = state_machine::transition(&current, status, Utc::now())?;
        if checked == current {
            return Ok(current);
        }
        let order = self
            .call(self.backend.transition_order_status(order_id, status))
            .await?;
        Ok(self.accept(order))
    }

    pub async fn cancel(&mut self, order_id: OrderId, reason: &str) -> Result<Order, ClientError> {
        let current = self.snapshot(order_id)?;
        let checked = state_machine::cancel(&current, reason, Utc::now())?;
        if checked == current {
            return Ok(current);
        }
        let order = self.call(self.backend.cancel_order(order_id, reason)).await?;
        Ok(self.accept(order))
    }

    pub async fn register_payment(
        &mut self,
        order_id: OrderId,
        request: PaymentRequest,
    ) -> Result<Order, ClientError> {
        let current = self.snapshot(order_id)?;
        ledger::validate_payment(&current, &request)?;
        let order = self
            .call(self.backend.register_payment(order_id, &request))
            .await?;
        Ok(self.accept(order))
    }

    /// Delivers a settled order. An order that still owes money is rejected
    /// locally; register the missing payment first.
    pub async fn finalize(&mut self, order_id: OrderId) -> Result<Order, ClientError> {
        let current = self.snapshot(order_id)?;
        ledger::finalize(&current, Utc::now())?;
        if current.status == OrderStatus::Delivered {
            return Ok(current);
        }
        let order = self
            .call(self.backend.transition_order_status(order_id, OrderStatus::Delivered))
            .await?;
        Ok(self.accept(order))
    }

    /// Fire-and-forget: the cache changes when the push update arrives.
    pub async fn mark_item_prepared(
        &mut self,
        order_id: OrderId,
        item_id: ItemId,
    ) -> Result<(), ClientError> {
        let current = self.snapshot(order_id)?;
        fulfillment::mark_item_prepared(&current, item_id)?;
        self.call(self.backend.mark_item_status(order_id, item_id, ItemStatus::Prepared))
            .await
    }

    pub async fn mark_all_prepared(&mut self, kitchen_id: KitchenId) -> Result<(), ClientError> {
        self.call(self.backend.mark_all_prepared(kitchen_id)).await
    }

    /// Keeps `order_id` visible after it turns terminal.
    pub fn pin(&mut self, order_id: OrderId) {
        self.pinned.insert(order_id);
    }

    pub fn unpin(&mut self, order_id: OrderId) {
        self.pinned.remove(&order_id);
        self.cache.evict_terminal(&self.pinned);
    }

    /// Cancels in-flight calls and stops receiving pushes.
    pub async fn close(&mut self) {
        self.closer().close().await;
        self.inbox.close();
        info!(kind = ?self.kind, "view: closed");
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.closed.is_cancelled() {
            Err(ClientError::ViewClosed)
        } else {
            Ok(())
        }
    }

    fn snapshot(&self, order_id: OrderId) -> Result<Order, ClientError> {
        self.ensure_open()?;
        self.cache
            .get(order_id)
            .cloned()
            .ok_or(ClientError::NotInView(order_id))
    }

    /// Runs one outbound call. A response that lands after the view closed
    /// is discarded.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        self.ensure_open()?;
        let result = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(ClientError::ViewClosed),
            result = request => result,
        };
        self.ensure_open()?;
        if let Err(ClientError::Conflict { status, message }) = &result {
            info!(status, %message, "view: backend state diverged, waiting for push update");
        }
        result
    }

    fn accept(&mut self, order: Order) -> Order {
        self.apply(PushMessage::Updated(order.clone()));
        order
    }

    fn apply(&mut self, message: PushMessage) -> MergeOutcome {
        let kind = message.kind();
        let outcome = self.cache.merge(message);
        debug!(message = kind, ?outcome, "view: merged");
        outcome
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
