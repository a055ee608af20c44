//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use copper_fox_core::{AddressId, OrderItemId, OrderId, OrderStatus, PaymentMethod, Price, ProductId, UserId};

/// A placed order with its line items and address snapshot.
///
/// Content is immutable after creation; only `status` changes, and only along
/// the transitions allowed by [`OrderStatus::allowed_transitions`].
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Total computed at checkout from prices current at that moment;
    /// never recomputed.
    pub total_price: Decimal,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

/// One ordered line with the unit price snapshotted at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price per unit at the moment of checkout, independent of later
    /// catalog changes.
    pub unit_price: Price,
}

/// Delivery details copied verbatim from checkout input; not a reference to
/// any saved address book.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShippingAddress {
    pub id: AddressId,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Shipping input supplied at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}
