use super::*;
use client_core::adapters::{BoardRow, TicketLine};
use order_core::fulfillment::Completion;
use shared::domain::{ItemId, OrderId, OrderStatus, PaymentStatus};

fn label(text: &str, urgency: Urgency) -> ElapsedLabel {
    ElapsedLabel {
        text: text.to_string(),
        urgency,
    }
}

#[test]
fn board_lists_columns_and_outstanding_balance() {
    let columns = vec![BoardColumn {
        status: OrderStatus::Preparing,
        rows: vec![
            BoardRow {
                order_id: OrderId(1),
                order_number: "0001".into(),
                customer: "Ana".into(),
                status: OrderStatus::Preparing,
                payment_status: PaymentStatus::Partial,
                remaining: 12.5,
                elapsed: label("12:04", Urgency::Warning),
            },
            BoardRow {
                order_id: OrderId(2),
                order_number: "0002".into(),
                customer: "Ben".into(),
                status: OrderStatus::Preparing,
                payment_status: PaymentStatus::Paid,
                remaining: 0.0,
                elapsed: label("02:10", Urgency::Normal),
            },
        ],
    }];

    let text = board(&columns);
    assert_eq!(
        text,
        "== preparing (2) ==\n  #0001 Ana [12:04 !] owes 12.50\n  #0002 Ben [02:10]\n"
    );
}

#[test]
fn empty_board_says_so() {
    assert_eq!(board(&[]), "no active orders\n");
}

#[test]
fn tickets_show_progress_and_lines() {
    let ticket = KitchenTicket {
        order_id: OrderId(3),
        order_number: "0003".into(),
        lines: vec![TicketLine {
            item_id: ItemId(9),
            name: "Burger".into(),
            quantity: 2,
        }],
        completion: Completion {
            prepared_qty: 1,
            total_qty: 3,
        },
        elapsed: label("25:30", Urgency::Critical),
    };

    let text = tickets("Grill", &[ticket]);
    assert_eq!(
        text,
        "Grill: 1 ticket(s)\n  #0003 1/3 prepared [25:30 !!]\n    Burger x2 (item 9)\n"
    );
    assert_eq!(tickets("Grill", &[]), "Grill: nothing to prepare\n");
}

#[test]
fn search_hits_include_status_and_id() {
    let found = vec![SearchHit {
        order_id: OrderId(4),
        order_number: "0004".into(),
        customer: "Cleo".into(),
        status: OrderStatus::Cancelled,
    }];
    assert_eq!(hits("cle", &found), "#0004 Cleo (cancelled) id=4\n");
    assert_eq!(hits("zzz", &[]), "no orders match \"zzz\"\n");
}
