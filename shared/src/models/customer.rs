//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer entity
///
/// `phone` is stored normalized (see server-side phone normalization) and is
/// UNIQUE — the dedupe key for walk-in and delivery customers alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    /// Normalized phone number (canonical +639XXXXXXXXX for local mobiles)
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create customer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub name: String,
    /// Raw phone as typed; normalized server-side
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Update customer payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}
