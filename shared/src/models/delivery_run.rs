//! Delivery Run Model (配送批次)

use serde::{Deserialize, Serialize};

use super::order::Order;

/// Delivery run status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RunStatus {
    /// Loading: orders can be assigned/unassigned
    Open,
    /// On the road
    Dispatched,
    /// Back at the store, awaiting remittance
    Returned,
    /// Remitted and closed
    Settled,
}

/// Delivery run entity — a rider/vehicle pairing carrying dispatched orders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryRun {
    pub id: i64,
    pub rider_id: i64,
    pub rider_name: String,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub status: RunStatus,
    pub note: Option<String>,
    pub dispatched_at: Option<i64>,
    pub returned_at: Option<i64>,
    pub settled_at: Option<i64>,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Run expense (fuel, parking, ...) — deducted from cash-to-remit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RunExpense {
    pub id: i64,
    pub run_id: i64,
    pub label: String,
    pub amount: f64,
    pub created_by: i64,
    pub created_at: i64,
}

/// Loadout summary for a run vs the vehicle's capacity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunLoadout {
    pub total_weight_kg: f64,
    pub stops: i64,
    pub max_load_kg: f64,
    pub max_stops: i64,
}

/// Delivery run with its orders, expenses and loadout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRunDetail {
    #[serde(flatten)]
    pub run: DeliveryRun,
    pub orders: Vec<Order>,
    pub expenses: Vec<RunExpense>,
    pub loadout: RunLoadout,
}

/// Create delivery run payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRunCreate {
    pub rider_id: i64,
    pub vehicle_id: i64,
    pub note: Option<String>,
}

/// Assign order to run payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAssignOrder {
    pub order_id: i64,
}

/// Mark order delivered payload (optional rider-collected COD cash)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunDeliverOrder {
    /// Cash collected by the rider, if any
    pub cod_amount: Option<f64>,
    pub note: Option<String>,
}

/// Add run expense payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExpenseCreate {
    pub label: String,
    pub amount: f64,
}
