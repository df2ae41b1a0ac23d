//! Canonical order statuses and the transitions between them.
//!
//! ```text
//!   pending ──► preparing ──► { ready, on_the_way, arrived }  (checklist, any order)
//!      │            │                    │
//!      │            ├────────────────────┴──► delivered (term., needs settlement)
//!      └────────────┴────────────────────────► cancelled (term., needs reason)
//! ```
//!
//! Requesting the status an order already has is a no-op, never an error.

use chrono::{DateTime, Utc};
use shared::domain::{Order, OrderStatus, StatusHistoryEntry};

use crate::{error::ValidationError, ledger};

const FROM_PENDING: &[OrderStatus] = &[OrderStatus::Preparing, OrderStatus::Cancelled];
const FROM_ACTIVE: &[OrderStatus] = &[
    OrderStatus::Ready,
    OrderStatus::OnTheWay,
    OrderStatus::Arrived,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

/// Statuses reachable from `status` in a single step.
pub fn allowed_transitions(status: OrderStatus) -> &'static [OrderStatus] {
    match status {
        OrderStatus::Pending => FROM_PENDING,
        OrderStatus::Preparing
        | OrderStatus::Ready
        | OrderStatus::OnTheWay
        | OrderStatus::Arrived => FROM_ACTIVE,
        OrderStatus::Delivered | OrderStatus::Cancelled => &[],
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Moves `order` to `requested`.
///
/// `delivered` additionally requires the order to be settled, and
/// `cancelled` must go through [`cancel`] so a reason is captured.
pub fn transition(
    order: &Order,
    requested: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, ValidationError> {
    if requested == order.status {
        return Ok(order.clone());
    }
    check_transition(order, requested)?;
    if requested == OrderStatus::Cancelled {
        return Err(ValidationError::MissingCancelReason);
    }
    if requested == OrderStatus::Delivered {
        ledger::ensure_settled(order)?;
    }
    Ok(apply(order, requested, now))
}

/// Cancels `order`, recording `reason`. The reason is captured verbatim.
pub fn cancel(order: &Order, reason: &str, now: DateTime<Utc>) -> Result<Order, ValidationError> {
    if order.status == OrderStatus::Cancelled {
        return Ok(order.clone());
    }
    if reason.trim().is_empty() {
        return Err(ValidationError::MissingCancelReason);
    }
    check_transition(order, OrderStatus::Cancelled)?;
    let mut next = apply(order, OrderStatus::Cancelled, now);
    next.cancel_reason = Some(reason.to_string());
    Ok(next)
}

/// Validates a status change without applying it. Same-status requests pass.
pub fn check_transition(order: &Order, requested: OrderStatus) -> Result<(), ValidationError> {
    if requested == order.status {
        return Ok(());
    }
    if order.status.is_terminal() {
        return Err(ValidationError::OrderTerminal {
            order_id: order.id,
            status: order.status,
        });
    }
    if !can_transition(order.status, requested) {
        return Err(ValidationError::IllegalTransition {
            from: order.status,
            to: requested,
        });
    }
    Ok(())
}

fn apply(order: &Order, status: OrderStatus, now: DateTime<Utc>) -> Order {
    let mut next = order.clone();
    next.status = status;
    next.status_history.push(StatusHistoryEntry {
        status,
        timestamp: now,
    });
    next.updated_at = now;
    next
}

#[cfg(test)]
#[path = "tests/state_machine_tests.rs"]
mod tests;
