//! First-boot seeding
//!
//! 首次启动时写入系统角色、默认管理员和门店单例行。
//! 所有操作幂等，可在每次启动时安全执行。

use sqlx::SqlitePool;

use crate::auth::permissions::get_default_permissions;
use crate::db::repository::{RepoResult, employee, role, store_info};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Seed system roles, the default admin account and store info
pub async fn ensure_defaults(pool: &SqlitePool) -> RepoResult<()> {
    let admin_role = role::create_system(
        pool,
        "admin",
        "Administrator",
        &get_default_permissions("admin"),
    )
    .await?;
    role::create_system(pool, "manager", "Manager", &get_default_permissions("manager")).await?;
    role::create_system(pool, "cashier", "Cashier", &get_default_permissions("cashier")).await?;
    role::create_system(pool, "rider", "Rider", &get_default_permissions("rider")).await?;

    store_info::ensure_exists(pool).await?;

    // Default admin on an empty employee table
    let employee_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee")
        .fetch_one(pool)
        .await
        .map_err(crate::db::repository::RepoError::from)?;
    if employee_count == 0 {
        let hash = crate::auth::hash_password(DEFAULT_ADMIN_PASSWORD)
            .map_err(|e| crate::db::repository::RepoError::Database(e.to_string()))?;
        employee::create(
            pool,
            &shared::models::EmployeeCreate {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                display_name: "Administrator".to_string(),
                password: String::new(),
                role_id: admin_role.id,
                phone: None,
                is_rider: false,
            },
            &hash,
        )
        .await?;
        tracing::warn!(
            "Seeded default admin account '{}' — change the password immediately",
            DEFAULT_ADMIN_USERNAME
        );
    }

    Ok(())
}
