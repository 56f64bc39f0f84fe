//! Role Model

use serde::{Deserialize, Serialize};

/// Role entity — named permission set
///
/// `permissions` is a comma-separated list ("shifts:manage,reports:view").
/// System roles (admin) cannot be edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub permissions: String,
    pub is_system: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Role {
    /// Split the CSV permission list
    pub fn permission_list(&self) -> Vec<String> {
        self.permissions
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Create role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub display_name: String,
    pub permissions: Vec<String>,
}

/// Update role payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoleUpdate {
    pub display_name: Option<String>,
    pub permissions: Option<Vec<String>>,
}
