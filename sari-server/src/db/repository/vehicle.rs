//! Vehicle Repository

use super::{RepoError, RepoResult};
use shared::models::{Vehicle, VehicleCreate, VehicleUpdate};
use sqlx::SqlitePool;

const VEHICLE_SELECT: &str = "SELECT id, name, plate_no, max_load_kg, max_stops, is_active, created_at, updated_at FROM vehicle";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Vehicle>> {
    let sql = format!("{VEHICLE_SELECT} ORDER BY name");
    let rows = sqlx::query_as::<_, Vehicle>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Vehicle>> {
    let sql = format!("{VEHICLE_SELECT} WHERE is_active = 1 ORDER BY name");
    let rows = sqlx::query_as::<_, Vehicle>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Vehicle>> {
    let sql = format!("{VEHICLE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Vehicle>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: &VehicleCreate) -> RepoResult<Vehicle> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO vehicle (id, name, plate_no, max_load_kg, max_stops, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.plate_no)
    .bind(data.max_load_kg)
    .bind(data.max_stops)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create vehicle".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &VehicleUpdate) -> RepoResult<Vehicle> {
    // Deactivation is blocked while the vehicle is out on a run
    if data.is_active == Some(false) {
        let on_run: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM delivery_run WHERE vehicle_id = ? AND status != 'SETTLED'",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        if on_run > 0 {
            return Err(RepoError::BusinessRule(
                "Vehicle has an unsettled delivery run".into(),
            ));
        }
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE vehicle SET name = COALESCE(?1, name), plate_no = COALESCE(?2, plate_no), max_load_kg = COALESCE(?3, max_load_kg), max_stops = COALESCE(?4, max_stops), is_active = COALESCE(?5, is_active), updated_at = ?6 WHERE id = ?7",
    )
    .bind(&data.name)
    .bind(&data.plate_no)
    .bind(data.max_load_kg)
    .bind(data.max_stops)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Vehicle {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Vehicle {id} not found")))
}
