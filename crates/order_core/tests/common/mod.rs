#![allow(dead_code)]

pub mod strategies;

use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{
    domain::{
        CustomerId, CustomerRef, DeliveryMethod, ItemId, ItemStatus, KitchenId, Order, OrderId,
        OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ProductId, StatusHistoryEntry,
        StoreId,
    },
    protocol::PaymentRequest,
};

pub const GRILL: KitchenId = KitchenId(1);
pub const FRYER: KitchenId = KitchenId(2);
pub const DRINKS: KitchenId = KitchenId(3);

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap() + Duration::seconds(seconds)
}

pub fn line(id: i64, kitchen_id: KitchenId, quantity: u32) -> OrderItem {
    OrderItem {
        id: ItemId(id),
        product_id: ProductId(id),
        kitchen_id,
        quantity,
        name: format!("product-{id}"),
        status: ItemStatus::Pending,
    }
}

pub fn order_with(id: i64, status: OrderStatus, subtotal: f64, items: Vec<OrderItem>) -> Order {
    Order {
        id: OrderId(id),
        order_number: format!("{id:04}"),
        store_id: StoreId(1),
        status,
        delivery_method: DeliveryMethod::Pickup,
        customer: CustomerRef {
            customer_id: CustomerId(1),
            name: "Walk-in".to_string(),
            phone: None,
        },
        items,
        payments: Vec::new(),
        payment_status: PaymentStatus::Unpaid,
        subtotal,
        total: subtotal,
        status_history: vec![StatusHistoryEntry {
            status,
            timestamp: at(0),
        }],
        created_at: at(0),
        updated_at: at(0),
        cancel_reason: None,
    }
}

pub fn payment(amount: f64, method: PaymentMethod) -> PaymentRequest {
    PaymentRequest {
        amount,
        tip: 0.0,
        method,
        cash_received: None,
    }
}
