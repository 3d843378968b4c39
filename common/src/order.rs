use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::UnknownVariant;

/// How the customer receives the goods. Wire strings match the original
/// client contract exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum DeliveryOption {
    #[serde(rename = "Pick-Up")]
    #[sqlx(rename = "Pick-Up")]
    PickUp,
    #[serde(rename = "Home Delivery")]
    #[sqlx(rename = "Home Delivery")]
    HomeDelivery,
}

impl Default for DeliveryOption {
    fn default() -> Self {
        DeliveryOption::HomeDelivery
    }
}

impl DeliveryOption {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryOption::PickUp => "Pick-Up",
            DeliveryOption::HomeDelivery => "Home Delivery",
        }
    }
}

impl fmt::Display for DeliveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle status.
///
/// Transitions are actor-gated (owning farmer or admin) and otherwise
/// unrestricted, except that the two terminal states cannot be left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    #[serde(rename = "IN_TRANSIT")]
    #[sqlx(rename = "IN_TRANSIT")]
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Delivered and cancelled orders are settled; nothing may follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if a status update from `self` to `next` is accepted.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return self == next;
        }
        true
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "IN_TRANSIT" => Ok(OrderStatus::InTransit),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// An order placed by a customer against a single farmer's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    pub farmer_id: i64,
    pub total_amount: f64,
    pub delivery_option: DeliveryOption,
    pub order_status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

/// A line of an order. `price` is the catalog price captured at order
/// time and never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

/// One requested line in a create-order call.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}
