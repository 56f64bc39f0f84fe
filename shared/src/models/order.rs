//! Order Model (订单)

use serde::{Deserialize, Serialize};

use super::payment::Payment;

/// Sales channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderChannel {
    Walkin,
    Delivery,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Open,
    Completed,
    Voided,
}

/// Delivery fulfillment state (NONE for walk-in orders)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Fulfillment {
    None,
    Pending,
    Assigned,
    Dispatched,
    Delivered,
    Returned,
}

/// Summary of a price rule applied to an order (stored as JSON)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedRule {
    pub rule_id: i64,
    pub receipt_name: String,
    /// "DISCOUNT" or "SURCHARGE"
    pub rule_type: String,
    /// Signed amount: negative for discounts, positive for surcharges
    pub amount: f64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub channel: OrderChannel,
    pub status: OrderStatus,
    pub fulfillment: Fulfillment,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    /// Address snapshot at order time (delivery orders)
    pub delivery_address: Option<String>,
    /// Set while the order sits on a delivery run
    pub delivery_run_id: Option<i64>,
    pub subtotal: f64,
    pub discount_total: f64,
    pub surcharge_total: f64,
    pub total: f64,
    /// Rules applied by the pricing engine at creation
    #[cfg_attr(feature = "db", sqlx(json))]
    pub applied_rules: Vec<AppliedRule>,
    pub note: Option<String>,
    pub created_by: i64,
    pub completed_at: Option<i64>,
    pub voided_at: Option<i64>,
    pub void_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item — immutable snapshot taken at order creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub name: String,
    pub qty: i64,
    pub unit_price: f64,
    pub unit_weight_kg: f64,
    pub line_subtotal: f64,
    pub discount: f64,
    pub surcharge: f64,
    pub line_total: f64,
}

/// Order with line items and payments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    /// total − non-cancelled payments
    pub balance_due: f64,
}

/// Line item input for order creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub qty: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub channel: OrderChannel,
    pub customer_id: Option<i64>,
    pub delivery_address: Option<String>,
    pub note: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Void order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderVoid {
    pub reason: String,
}
