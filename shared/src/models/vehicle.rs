//! Vehicle Model (配送车辆)

use serde::{Deserialize, Serialize};

/// Delivery vehicle entity
///
/// Capacity fields drive the dispatch loadout check: a run's total cargo
/// weight may not exceed `max_load_kg` and its stop count may not exceed
/// `max_stops`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub plate_no: String,
    /// Maximum cargo weight in kg
    pub max_load_kg: f64,
    /// Maximum number of delivery stops per run
    pub max_stops: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create vehicle payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreate {
    pub name: String,
    pub plate_no: String,
    pub max_load_kg: f64,
    pub max_stops: i64,
}

/// Update vehicle payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VehicleUpdate {
    pub name: Option<String>,
    pub plate_no: Option<String>,
    pub max_load_kg: Option<f64>,
    pub max_stops: Option<i64>,
    pub is_active: Option<bool>,
}
