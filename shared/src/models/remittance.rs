//! Remittance Model (骑手交款)

use serde::{Deserialize, Serialize};

/// Remittance record — rider cash settlement for a returned run
///
/// `expected_amount` is the cash-to-remit computation: COD cash collected on
/// the run minus run expenses. `variance` = remitted − expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Remittance {
    pub id: i64,
    /// One remittance per run (UNIQUE)
    pub run_id: i64,
    pub rider_id: i64,
    pub rider_name: String,
    pub expected_amount: f64,
    pub remitted_amount: f64,
    pub variance: f64,
    pub note: Option<String>,
    /// Back-office employee who received the cash
    pub received_by: i64,
    pub created_at: i64,
}

/// Cash-to-remit preview for a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemitPreview {
    pub run_id: i64,
    /// Non-cancelled COD cash collected on the run
    pub cod_collected: f64,
    /// Total approved run expenses
    pub expense_total: f64,
    /// cod_collected − expense_total
    pub cash_to_remit: f64,
    pub delivered_orders: i64,
    pub returned_orders: i64,
}

/// Record remittance payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemittanceCreate {
    pub run_id: i64,
    pub remitted_amount: f64,
    pub note: Option<String>,
}
