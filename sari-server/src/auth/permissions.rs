//! Permission Definitions
//!
//! Simplified RBAC permission system.
//!
//! ## 设计原则
//! - 基础操作（查看商品、下单、基础收银）无需权限，登录即可使用
//! - 模块化权限：按功能模块授权
//! - 敏感操作：单独控制高风险操作
//! - 用户管理：仅 admin 角色可用（is_system 保护）

/// 可配置权限列表
/// 不包含 "all" 和 "users:manage"，这些是系统级权限
pub const ALL_PERMISSIONS: &[&str] = &[
    // === 模块化权限 ===
    "catalog:manage",     // 商品/分类管理
    "customers:manage",   // 客户管理
    "shifts:manage",      // 班次管理（关闭他人班次、强制关闭）
    "dispatch:manage",    // 配送批次管理
    "remit:manage",       // 骑手交款
    "clearance:manage",   // 挂账清收（核销）
    "price_rules:manage", // 价格规则管理
    "reports:view",       // 报表/审计查看
    "settings:manage",    // 门店设置

    // === 敏感操作 ===
    "orders:void",     // 作废订单
    "orders:discount", // 手动折扣
];

/// Admin 专属权限（不在可配置列表中）
pub const ADMIN_ONLY_PERMISSIONS: &[&str] = &[
    "users:manage", // 用户管理
    "all",          // 超级权限
];

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// 经理角色默认权限（全部可配置权限）
pub const DEFAULT_MANAGER_PERMISSIONS: &[&str] = &[
    "catalog:manage",
    "customers:manage",
    "shifts:manage",
    "dispatch:manage",
    "remit:manage",
    "clearance:manage",
    "price_rules:manage",
    "reports:view",
    "settings:manage",
    "orders:void",
    "orders:discount",
];

/// 收银员默认权限
pub const DEFAULT_CASHIER_PERMISSIONS: &[&str] = &["customers:manage"];

/// 骑手默认权限（移动端只读）
pub const DEFAULT_RIDER_PERMISSIONS: &[&str] = &[];

/// Get permissions for a role name
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    let perms: &[&str] = match role_name {
        "admin" => DEFAULT_ADMIN_PERMISSIONS,
        "manager" => DEFAULT_MANAGER_PERMISSIONS,
        "cashier" => DEFAULT_CASHIER_PERMISSIONS,
        "rider" => DEFAULT_RIDER_PERMISSIONS,
        _ => &[],
    };
    perms.iter().map(|s| s.to_string()).collect()
}

/// Check that every permission in a list is a known configurable permission
pub fn validate_permissions(perms: &[String]) -> Result<(), String> {
    for p in perms {
        if !ALL_PERMISSIONS.contains(&p.as_str()) {
            return Err(format!("Unknown permission: {p}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_only_perms_are_not_configurable() {
        for p in ADMIN_ONLY_PERMISSIONS {
            assert!(!ALL_PERMISSIONS.contains(p));
        }
    }

    #[test]
    fn validate_rejects_unknown() {
        assert!(validate_permissions(&["shifts:manage".into()]).is_ok());
        assert!(validate_permissions(&["all".into()]).is_err());
        assert!(validate_permissions(&["made:up".into()]).is_err());
    }
}
