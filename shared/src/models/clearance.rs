//! Clearance Case Model (挂账清收)

use serde::{Deserialize, Serialize};

/// Clearance case status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ClearanceStatus {
    Open,
    Settled,
    WrittenOff,
}

/// Clearance case — manager review item for an order completed with an
/// outstanding balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ClearanceCase {
    pub id: i64,
    /// One case per order (UNIQUE)
    pub order_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    /// Balance due when the case was opened
    pub amount_original: f64,
    /// Remaining outstanding balance
    pub amount_outstanding: f64,
    pub status: ClearanceStatus,
    pub resolved_by: Option<i64>,
    pub resolution_note: Option<String>,
    pub resolved_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Settle clearance payload — records a payment against the order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceSettle {
    pub amount: f64,
    /// Payment method for the collected amount ("CASH", "CARD", "WALLET")
    pub method: super::payment::PaymentMethod,
    pub note: Option<String>,
}

/// Write off clearance payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceWriteOff {
    pub note: String,
}
