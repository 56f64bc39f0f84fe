//! Payment Model

use serde::{Deserialize, Serialize};

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    Cash,
    Card,
    Wallet,
}

/// Payment record
///
/// Counter CASH payments carry `shift_id` (they live in the cashier's
/// drawer); rider-collected COD cash carries `delivery_run_id` (it settles
/// through remittance). The two are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount: f64,
    /// Cash tendered by the customer
    pub tendered: Option<f64>,
    pub change_amount: Option<f64>,
    /// Cashier shift that received this payment (counter cash)
    pub shift_id: Option<i64>,
    /// Delivery run that collected this payment (rider COD)
    pub delivery_run_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    pub cancelled: bool,
    pub cancel_reason: Option<String>,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Record payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub method: PaymentMethod,
    pub amount: f64,
    pub tendered: Option<f64>,
    pub note: Option<String>,
}
