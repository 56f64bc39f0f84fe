//! Role Repository

use super::{RepoError, RepoResult};
use shared::models::{Role, RoleCreate, RoleUpdate};
use sqlx::SqlitePool;

const ROLE_SELECT: &str =
    "SELECT id, name, display_name, permissions, is_system, created_at, updated_at FROM role";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("{ROLE_SELECT} ORDER BY id");
    let roles = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE id = ?");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE name = ?");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

pub async fn create(pool: &SqlitePool, data: RoleCreate) -> RepoResult<Role> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let permissions = data.permissions.join(",");

    sqlx::query(
        "INSERT INTO role (id, name, display_name, permissions, is_system, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.display_name)
    .bind(&permissions)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

/// Insert a seeded system role (idempotent by name)
pub async fn create_system(
    pool: &SqlitePool,
    name: &str,
    display_name: &str,
    permissions: &[String],
) -> RepoResult<Role> {
    if let Some(existing) = find_by_name(pool, name).await? {
        return Ok(existing);
    }
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO role (id, name, display_name, permissions, is_system, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(id)
    .bind(name)
    .bind(display_name)
    .bind(permissions.join(","))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to seed role".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<Role> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;
    if existing.is_system {
        return Err(RepoError::BusinessRule(
            "System roles cannot be modified".into(),
        ));
    }

    let now = shared::util::now_millis();
    let permissions = data.permissions.map(|p| p.join(","));

    sqlx::query(
        "UPDATE role SET display_name = COALESCE(?1, display_name), permissions = COALESCE(?2, permissions), updated_at = ?3 WHERE id = ?4",
    )
    .bind(data.display_name)
    .bind(permissions)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;
    if existing.is_system {
        return Err(RepoError::BusinessRule(
            "System roles cannot be deleted".into(),
        ));
    }

    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee WHERE role_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if in_use > 0 {
        return Err(RepoError::BusinessRule(format!(
            "Role is assigned to {in_use} employee(s)"
        )));
    }

    let rows = sqlx::query("DELETE FROM role WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
