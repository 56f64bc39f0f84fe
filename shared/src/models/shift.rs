//! Shift Model (班次管理)

use serde::{Deserialize, Serialize};

/// Shift status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl Default for ShiftStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// Shift record — a cashier's till session
///
/// `expected_cash` = starting float + counter cash payments received.
/// `cash_variance` = actual − expected, set exactly once at close from the
/// cashier's submitted count. Force-closed shifts never get a variance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Shift {
    pub id: i64,
    /// Operator employee ID (one OPEN shift per operator)
    pub operator_id: i64,
    /// Operator display name snapshot
    pub operator_name: String,
    pub status: ShiftStatus,
    pub start_time: i64,
    pub end_time: Option<i64>,
    /// Opening float
    pub starting_cash: f64,
    /// Starting cash + counter cash payments received
    pub expected_cash: f64,
    /// Actual cash counted at close
    pub actual_cash: Option<f64>,
    /// Cash variance (actual − expected)
    pub cash_variance: Option<f64>,
    /// Whether shift was closed abnormally (power failure, force-close)
    #[serde(default)]
    pub abnormal_close: bool,
    /// Last heartbeat timestamp
    pub last_active_at: Option<i64>,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Open shift payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftCreate {
    /// Starting cash amount (default 0)
    #[serde(default)]
    pub starting_cash: f64,
    pub note: Option<String>,
}

/// Close shift payload (normal close with cash counting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftClose {
    /// Actual cash counted
    pub actual_cash: f64,
    pub note: Option<String>,
}

/// Force close shift payload (abnormal close without cash counting)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShiftForceClose {
    pub note: Option<String>,
}

/// Update shift payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShiftUpdate {
    /// Update starting cash (only while OPEN; shifts expected_cash too)
    pub starting_cash: Option<f64>,
    pub note: Option<String>,
}
