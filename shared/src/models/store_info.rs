//! Store Info Model

use serde::{Deserialize, Serialize};

/// Store information entity (singleton, id = 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StoreInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub phone: Option<String>,
    /// ISO 4217 currency code shown on receipts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// 营业日分界时间 (HH:MM 格式，如 "02:00")
    #[serde(default = "default_cutoff")]
    pub business_day_cutoff: String,
    /// Remit variance beyond this absolute amount requires a note
    #[serde(default)]
    pub remit_variance_tolerance: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_cutoff() -> String {
    "02:00".to_string()
}

fn default_currency() -> String {
    "PHP".to_string()
}

/// Update store info payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreInfoUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub currency: Option<String>,
    pub business_day_cutoff: Option<String>,
    pub remit_variance_tolerance: Option<f64>,
}
