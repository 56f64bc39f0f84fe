//! Employee Repository

use super::{RepoError, RepoResult};
use shared::models::{EmployeeCreate, EmployeeResponse, EmployeeUpdate};
use sqlx::SqlitePool;

const EMPLOYEE_SELECT: &str = "SELECT e.id, e.username, e.display_name, e.role_id, r.name as role_name, e.phone, e.is_rider, e.is_active, e.created_at, e.updated_at FROM employee e JOIN role r ON e.role_id = r.id";

/// Row used by the login path: credentials + resolved role permissions
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeAuth {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role_name: String,
    pub permissions: String,
    pub is_active: bool,
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<EmployeeResponse>> {
    let sql = format!("{EMPLOYEE_SELECT} ORDER BY e.created_at");
    let rows = sqlx::query_as::<_, EmployeeResponse>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<EmployeeResponse>> {
    let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
    let row = sqlx::query_as::<_, EmployeeResponse>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Active riders for the dispatch UI
pub async fn find_riders(pool: &SqlitePool) -> RepoResult<Vec<EmployeeResponse>> {
    let sql = format!(
        "{EMPLOYEE_SELECT} WHERE e.is_rider = 1 AND e.is_active = 1 ORDER BY e.display_name"
    );
    let rows = sqlx::query_as::<_, EmployeeResponse>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Credentials lookup for login — includes inactive users so the caller can
/// reject them with the same unified error
pub async fn find_auth_by_username(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Option<EmployeeAuth>> {
    let row = sqlx::query_as::<_, EmployeeAuth>(
        "SELECT e.id, e.username, e.display_name, e.password_hash, r.name as role_name, r.permissions, e.is_active FROM employee e JOIN role r ON e.role_id = r.id WHERE e.username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Password hash lookup for self-service password change
pub async fn find_password_hash(pool: &SqlitePool, id: i64) -> RepoResult<Option<String>> {
    let hash: Option<String> = sqlx::query_scalar("SELECT password_hash FROM employee WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(hash)
}

pub async fn create(
    pool: &SqlitePool,
    data: &EmployeeCreate,
    password_hash: &str,
) -> RepoResult<EmployeeResponse> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO employee (id, username, display_name, password_hash, role_id, phone, is_rider, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
    )
    .bind(id)
    .bind(&data.username)
    .bind(&data.display_name)
    .bind(password_hash)
    .bind(data.role_id)
    .bind(&data.phone)
    .bind(data.is_rider)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create employee".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &EmployeeUpdate,
    password_hash: Option<String>,
) -> RepoResult<EmployeeResponse> {
    let now = shared::util::now_millis();

    let rows = sqlx::query(
        "UPDATE employee SET display_name = COALESCE(?1, display_name), password_hash = COALESCE(?2, password_hash), role_id = COALESCE(?3, role_id), phone = COALESCE(?4, phone), is_rider = COALESCE(?5, is_rider), is_active = COALESCE(?6, is_active), updated_at = ?7 WHERE id = ?8",
    )
    .bind(&data.display_name)
    .bind(password_hash)
    .bind(data.role_id)
    .bind(&data.phone)
    .bind(data.is_rider)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Employee {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Employee {id} not found")))
}

pub async fn set_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE employee SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Employee {id} not found")));
    }
    Ok(())
}

/// Employees are never hard-deleted (payments and runs reference them)
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE employee SET is_active = 0, updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
