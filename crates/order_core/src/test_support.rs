use chrono::{DateTime, TimeZone, Utc};
use shared::domain::{
    CustomerId, CustomerRef, DeliveryMethod, ItemId, ItemStatus, KitchenId, Order, OrderId,
    OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ProductId, StatusHistoryEntry, StoreId,
};
use shared::protocol::PaymentRequest;

pub const GRILL: KitchenId = KitchenId(1);
pub const DRINKS: KitchenId = KitchenId(2);

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(i64::from(minute))
}

pub fn item(id: i64, kitchen_id: KitchenId, quantity: u32) -> OrderItem {
    OrderItem {
        id: ItemId(id),
        product_id: ProductId(100 + id),
        kitchen_id,
        quantity,
        name: format!("item-{id}"),
        status: ItemStatus::Pending,
    }
}

/// Order `id` with subtotal 300: two burgers on the grill, one soda at drinks.
pub fn order(id: i64, status: OrderStatus) -> Order {
    Order {
        id: OrderId(id),
        order_number: format!("A-{id:03}"),
        store_id: StoreId(1),
        status,
        delivery_method: DeliveryMethod::Delivery,
        customer: CustomerRef {
            customer_id: CustomerId(9),
            name: "Dana".to_string(),
            phone: None,
        },
        items: vec![item(1, GRILL, 2), item(2, DRINKS, 1)],
        payments: Vec::new(),
        payment_status: PaymentStatus::Unpaid,
        subtotal: 300.0,
        total: 320.0,
        status_history: vec![StatusHistoryEntry {
            status,
            timestamp: at(0),
        }],
        created_at: at(0),
        updated_at: at(0),
        cancel_reason: None,
    }
}

pub fn card(amount: f64) -> PaymentRequest {
    PaymentRequest {
        amount,
        tip: 0.0,
        method: PaymentMethod::Card,
        cash_received: None,
    }
}
