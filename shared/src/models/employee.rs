//! Employee Model (员工/骑手)

use serde::{Deserialize, Serialize};

/// Employee entity
///
/// Riders are employees with `is_rider = true`; they can be assigned to
/// delivery runs. `password_hash` never leaves the server — API responses
/// use [`EmployeeResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: i64,
    pub phone: Option<String>,
    pub is_rider: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Employee response (without password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct EmployeeResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role_id: i64,
    pub role_name: String,
    pub phone: Option<String>,
    pub is_rider: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create employee payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub role_id: i64,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_rider: bool,
}

/// Update employee payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmployeeUpdate {
    pub display_name: Option<String>,
    /// New password (re-hashed server-side)
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub phone: Option<String>,
    pub is_rider: Option<bool>,
    pub is_active: Option<bool>,
}

/// Self-service password change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}
