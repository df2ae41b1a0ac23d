use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance used for every money comparison, in currency units.
pub const MONEY_EPSILON: f64 = 0.001;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(OrderId);
id_newtype!(ItemId);
id_newtype!(KitchenId);
id_newtype!(StoreId);
id_newtype!(ProductId);
id_newtype!(CustomerId);

/// Legacy wire names that older clients send for the state after `pending`.
///
/// Both spellings were observed for the same state; they parse to
/// [`OrderStatus::Preparing`] and are never emitted.
pub const PREPARING_ALIASES: &[&str] = &["accepted", "confirmed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    #[serde(alias = "accepted", alias = "confirmed")]
    Preparing,
    Ready,
    #[serde(alias = "onTheWay")]
    OnTheWay,
    Arrived,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending,
        Self::Preparing,
        Self::Ready,
        Self::OnTheWay,
        Self::Arrived,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// No further transitions are possible from a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OnTheWay => "on_the_way",
            Self::Arrived => "arrived",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        if PREPARING_ALIASES
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(normalized))
        {
            return Ok(Self::Preparing);
        }
        match normalized {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "on_the_way" | "onTheWay" => Ok(Self::OnTheWay),
            "arrived" => Ok(Self::Arrived),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Delivery,
    Pickup,
    DineIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Prepared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub customer_id: CustomerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ItemId,
    pub product_id: ProductId,
    pub kitchen_id: KitchenId,
    pub quantity: u32,
    pub name: String,
    #[serde(default)]
    pub status: ItemStatus,
}

impl OrderItem {
    pub fn is_prepared(&self) -> bool {
        self.status == ItemStatus::Prepared
    }
}

/// One settled slice of an order. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount: f64,
    #[serde(default)]
    pub tip: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_received: Option<f64>,
    #[serde(default)]
    pub change_given: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

/// The full order aggregate. Push updates always carry a whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub store_id: StoreId,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub customer: CustomerRef,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub subtotal: f64,
    pub total: f64,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Order {
    pub fn item(&self, item_id: ItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kitchen {
    pub id: KitchenId,
    pub name: String,
    pub store_id: StoreId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub kitchen_id: KitchenId,
    pub price: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub currency: String,
}
