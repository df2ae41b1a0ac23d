use proptest::prelude::*;
use shared::domain::{KitchenId, Order, OrderItem, OrderStatus};

use super::{line, order_with, DRINKS, FRYER, GRILL};

pub fn kitchen_strategy() -> impl Strategy<Value = KitchenId> {
    prop_oneof![Just(GRILL), Just(FRYER), Just(DRINKS)]
}

pub fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    proptest::sample::select(OrderStatus::ALL.to_vec())
}

/// Money in whole cents, as the point of sale produces it.
pub fn money_strategy(max_cents: i64) -> impl Strategy<Value = f64> {
    (1..=max_cents).prop_map(|cents| cents as f64 / 100.0)
}

pub fn items_strategy() -> impl Strategy<Value = Vec<OrderItem>> {
    prop::collection::vec((kitchen_strategy(), 1u32..5, any::<bool>()), 0..6).prop_map(|lines| {
        lines
            .into_iter()
            .enumerate()
            .map(|(index, (kitchen_id, quantity, prepared))| {
                let mut item = line(index as i64 + 1, kitchen_id, quantity);
                if prepared {
                    item.status = shared::domain::ItemStatus::Prepared;
                }
                item
            })
            .collect()
    })
}

pub fn order_strategy(id: i64) -> impl Strategy<Value = Order> {
    (status_strategy(), money_strategy(50_000), items_strategy())
        .prop_map(move |(status, subtotal, items)| order_with(id, status, subtotal, items))
}
