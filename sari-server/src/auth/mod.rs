//! 认证模块
//!
//! JWT + Argon2 认证体系：
//! - [`JwtService`] - 令牌签发与验证
//! - [`CurrentUser`] - 请求上下文中的当前用户
//! - [`middleware`] - 认证/权限中间件
//! - [`permissions`] - RBAC 权限定义

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_permission};

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::utils::AppError;

/// Hash a password with Argon2id and a fresh salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Current authenticated user, injected into request extensions
#[derive(Debug, Clone, serde::Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl CurrentUser {
    /// Check a permission against the user's grant list.
    ///
    /// Supports the `"all"` super-permission and `"orders:*"` wildcards.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| {
            if granted == "all" || granted == permission {
                return true;
            }
            if let Some(prefix) = granted.strip_suffix(":*") {
                return permission
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with(':'));
            }
            false
        })
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.sub.parse()?,
            username: claims.username,
            display_name: claims.display_name,
            role: claims.role,
            permissions: claims
                .permissions
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(perms: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 1,
            username: "maria".into(),
            display_name: "Maria".into(),
            role: "manager".into(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn all_grants_everything() {
        let u = user(&["all"]);
        assert!(u.has_permission("shifts:manage"));
        assert!(u.has_permission("orders:void"));
    }

    #[test]
    fn exact_match_only() {
        let u = user(&["shifts:manage"]);
        assert!(u.has_permission("shifts:manage"));
        assert!(!u.has_permission("orders:void"));
    }

    #[test]
    fn wildcard_scopes_to_prefix() {
        let u = user(&["orders:*"]);
        assert!(u.has_permission("orders:void"));
        assert!(u.has_permission("orders:discount"));
        assert!(!u.has_permission("shifts:manage"));
        // prefix must be a full segment
        assert!(!u.has_permission("ordersmore:void"));
    }
}
