use super::*;
use crate::{ledger, test_support::*};

#[test]
fn pending_only_moves_to_preparing_or_cancelled() {
    assert_eq!(
        allowed_transitions(OrderStatus::Pending),
        &[OrderStatus::Preparing, OrderStatus::Cancelled]
    );
    let pending = order(1, OrderStatus::Pending);
    let err = transition(&pending, OrderStatus::Ready, at(1)).expect_err("skip preparing");
    assert_eq!(
        err,
        ValidationError::IllegalTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Ready,
        }
    );
}

#[test]
fn checklist_states_move_in_any_order() {
    let mut current = transition(&order(1, OrderStatus::Pending), OrderStatus::Preparing, at(1))
        .expect("accept");
    for (minute, next) in [
        (2, OrderStatus::Arrived),
        (3, OrderStatus::Ready),
        (4, OrderStatus::OnTheWay),
        (5, OrderStatus::Ready),
    ] {
        current = transition(&current, next, at(minute)).expect("checklist move");
        assert_eq!(current.status, next);
    }
    assert_eq!(current.status_history.len(), 6);
    assert_eq!(current.updated_at, at(5));
}

#[test]
fn nothing_returns_to_pending_or_preparing() {
    let ready = order(1, OrderStatus::Ready);
    assert!(transition(&ready, OrderStatus::Pending, at(1)).is_err());
    assert!(transition(&ready, OrderStatus::Preparing, at(1)).is_err());
}

#[test]
fn same_status_is_a_no_op() {
    let ready = order(1, OrderStatus::Ready);
    let next = transition(&ready, OrderStatus::Ready, at(9)).expect("no-op");
    assert_eq!(next, ready);

    let delivered = order(2, OrderStatus::Delivered);
    assert_eq!(
        transition(&delivered, OrderStatus::Delivered, at(9)).expect("no-op"),
        delivered
    );
}

#[test]
fn terminal_orders_reject_changes() {
    for status in [OrderStatus::Delivered, OrderStatus::Cancelled] {
        let terminal = order(4, status);
        for target in OrderStatus::ALL.into_iter().filter(|s| *s != status) {
            let err = transition(&terminal, target, at(1)).expect_err("terminal");
            assert_eq!(
                err,
                ValidationError::OrderTerminal {
                    order_id: terminal.id,
                    status,
                }
            );
        }
    }
}

#[test]
fn delivered_requires_full_settlement() {
    let ready = order(1, OrderStatus::Ready);
    let err = transition(&ready, OrderStatus::Delivered, at(1)).expect_err("unpaid");
    assert!(matches!(err, ValidationError::NotFullyPaid { remaining, .. } if remaining == 300.0));

    let paid = ledger::register_payment(&ready, &card(300.0), at(2)).expect("pay");
    let delivered = transition(&paid, OrderStatus::Delivered, at(3)).expect("deliver");
    assert_eq!(delivered.status, OrderStatus::Delivered);
}

#[test]
fn cancelled_through_transition_demands_a_reason() {
    let err = transition(&order(1, OrderStatus::Preparing), OrderStatus::Cancelled, at(1))
        .expect_err("reason needed");
    assert_eq!(err, ValidationError::MissingCancelReason);
}

#[test]
fn cancel_records_reason_from_any_non_terminal_status() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OnTheWay,
        OrderStatus::Arrived,
    ] {
        let cancelled = cancel(&order(1, status), "customer left", at(3)).expect("cancel");
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("customer left"));
        assert_eq!(
            cancelled.status_history.last().map(|entry| entry.status),
            Some(OrderStatus::Cancelled)
        );
    }
}

#[test]
fn cancel_rejects_blank_reason_and_delivered_orders() {
    let ready = order(1, OrderStatus::Ready);
    assert_eq!(
        cancel(&ready, "   ", at(1)).expect_err("blank"),
        ValidationError::MissingCancelReason
    );
    let delivered = order(2, OrderStatus::Delivered);
    assert!(matches!(
        cancel(&delivered, "too late", at(1)),
        Err(ValidationError::OrderTerminal { .. })
    ));
}

#[test]
fn cancelling_twice_keeps_first_reason() {
    let cancelled = cancel(&order(1, OrderStatus::Ready), "first", at(1)).expect("cancel");
    let again = cancel(&cancelled, "second", at(2)).expect("no-op");
    assert_eq!(again.cancel_reason.as_deref(), Some("first"));
    assert_eq!(again, cancelled);
}

#[test]
fn rejected_transition_leaves_input_untouched() {
    let pending = order(1, OrderStatus::Pending);
    let snapshot = pending.clone();
    let _ = transition(&pending, OrderStatus::Arrived, at(1));
    assert_eq!(pending, snapshot);
}
