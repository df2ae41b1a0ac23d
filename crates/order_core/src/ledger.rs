//! Append-only payment ledger for a single order.
//!
//! Money never double-counts: a payment is accepted only while the order has
//! a remaining balance, and never for more than that balance (within
//! [`MONEY_EPSILON`]). Tips ride along with a payment but never count toward
//! the subtotal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Order, OrderStatus, Payment, PaymentMethod, PaymentStatus, MONEY_EPSILON},
    protocol::PaymentRequest,
};

use crate::{error::ValidationError, state_machine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipMode {
    Amount,
    Percent,
}

/// Read-only summary of an order's ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub paid: f64,
    pub tips: f64,
    pub remaining: f64,
    pub status: PaymentStatus,
}

pub fn paid_total(order: &Order) -> f64 {
    order.payments.iter().map(|payment| payment.amount).sum()
}

pub fn tips_total(order: &Order) -> f64 {
    order.payments.iter().map(|payment| payment.tip).sum()
}

/// `max(0, subtotal - Σ payments.amount)`.
pub fn remaining(order: &Order) -> f64 {
    (order.subtotal - paid_total(order)).max(0.0)
}

pub fn derive_payment_status(order: &Order) -> PaymentStatus {
    let paid = paid_total(order);
    if paid + MONEY_EPSILON >= order.subtotal {
        PaymentStatus::Paid
    } else if order.payments.is_empty() {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    }
}

pub fn is_settled(order: &Order) -> bool {
    derive_payment_status(order) == PaymentStatus::Paid
}

pub fn settlement(order: &Order) -> Settlement {
    Settlement {
        paid: paid_total(order),
        tips: tips_total(order),
        remaining: remaining(order),
        status: derive_payment_status(order),
    }
}

pub fn compute_tip(mode: TipMode, value: f64, remaining: f64) -> f64 {
    match mode {
        TipMode::Amount => value,
        TipMode::Percent => remaining * value / 100.0,
    }
}

/// Change owed for a cash payment, floored at zero.
pub fn compute_change(cash_received: f64, amount: f64, tip: f64) -> f64 {
    (cash_received - (amount + tip)).max(0.0)
}

/// Checks every precondition of [`register_payment`] without touching the order.
pub fn validate_payment(order: &Order, request: &PaymentRequest) -> Result<(), ValidationError> {
    if !request.amount.is_finite() {
        return Err(ValidationError::NonFinite { field: "amount" });
    }
    if !request.tip.is_finite() {
        return Err(ValidationError::NonFinite { field: "tip" });
    }
    if let Some(cash) = request.cash_received {
        if !cash.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "cash_received",
            });
        }
    }
    if order.status.is_terminal() {
        return Err(ValidationError::OrderTerminal {
            order_id: order.id,
            status: order.status,
        });
    }
    if is_settled(order) {
        return Err(ValidationError::AlreadyPaid { order_id: order.id });
    }
    if request.amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount {
            amount: request.amount,
        });
    }
    if request.tip < 0.0 {
        return Err(ValidationError::InvalidTip { tip: request.tip });
    }
    let remaining = remaining(order);
    if request.amount > remaining + MONEY_EPSILON {
        return Err(ValidationError::ExceedsRemaining {
            amount: request.amount,
            remaining,
        });
    }
    Ok(())
}

/// Appends a payment entry and recomputes `payment_status`.
pub fn register_payment(
    order: &Order,
    request: &PaymentRequest,
    now: DateTime<Utc>,
) -> Result<Order, ValidationError> {
    validate_payment(order, request)?;

    let change_given = match (request.method, request.cash_received) {
        (PaymentMethod::Cash, Some(cash)) => compute_change(cash, request.amount, request.tip),
        _ => 0.0,
    };

    let mut next = order.clone();
    next.payments.push(Payment {
        method: request.method,
        amount: request.amount,
        tip: request.tip,
        cash_received: request.cash_received,
        change_given,
        timestamp: now,
    });
    next.payment_status = derive_payment_status(&next);
    next.updated_at = now;
    Ok(next)
}

pub fn ensure_settled(order: &Order) -> Result<(), ValidationError> {
    if is_settled(order) {
        Ok(())
    } else {
        Err(ValidationError::NotFullyPaid {
            order_id: order.id,
            remaining: remaining(order),
        })
    }
}

/// Closes a settled order by moving it to `delivered`.
///
/// An order that still owes money is rejected; the caller registers the
/// missing payment first.
pub fn finalize(order: &Order, now: DateTime<Utc>) -> Result<Order, ValidationError> {
    ensure_settled(order)?;
    state_machine::transition(order, OrderStatus::Delivered, now)
}

#[cfg(test)]
#[path = "tests/ledger_tests.rs"]
mod tests;
