use shared::domain::{ItemId, OrderId, OrderStatus};
use thiserror::Error;

/// A precondition failed locally. Raised before any request leaves the view.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("order {order_id} is {status} and accepts no further changes")]
    OrderTerminal {
        order_id: OrderId,
        status: OrderStatus,
    },
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("cancelling an order requires a non-empty reason")]
    MissingCancelReason,
    #[error("order {order_id} still owes {remaining:.2} and cannot be delivered")]
    NotFullyPaid { order_id: OrderId, remaining: f64 },
    #[error("order {order_id} is already fully paid")]
    AlreadyPaid { order_id: OrderId },
    #[error("payment amount must be positive, got {amount}")]
    NonPositiveAmount { amount: f64 },
    #[error("payment amount {amount:.2} exceeds remaining balance {remaining:.2}")]
    ExceedsRemaining { amount: f64, remaining: f64 },
    #[error("tip must be a non-negative amount, got {tip}")]
    InvalidTip { tip: f64 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("order {order_id} has no item {item_id}")]
    UnknownItem { order_id: OrderId, item_id: ItemId },
}
