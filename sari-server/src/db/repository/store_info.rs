//! Store Info Repository (singleton row, id = 1)

use super::{RepoError, RepoResult};
use shared::models::{StoreInfo, StoreInfoUpdate};
use sqlx::SqlitePool;

const STORE_SELECT: &str = "SELECT id, name, address, phone, currency, business_day_cutoff, remit_variance_tolerance, created_at, updated_at FROM store_info WHERE id = 1";

pub async fn get(pool: &SqlitePool) -> RepoResult<Option<StoreInfo>> {
    let row = sqlx::query_as::<_, StoreInfo>(STORE_SELECT)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Seed the singleton row if missing
pub async fn ensure_exists(pool: &SqlitePool) -> RepoResult<StoreInfo> {
    if let Some(existing) = get(pool).await? {
        return Ok(existing);
    }
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT OR IGNORE INTO store_info (id, name, address, currency, business_day_cutoff, remit_variance_tolerance, created_at, updated_at) VALUES (1, '', '', 'PHP', '02:00', 0, ?1, ?1)",
    )
    .bind(now)
    .execute(pool)
    .await?;
    get(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to seed store info".into()))
}

pub async fn update(pool: &SqlitePool, data: &StoreInfoUpdate) -> RepoResult<StoreInfo> {
    ensure_exists(pool).await?;
    let now = shared::util::now_millis();

    sqlx::query(
        "UPDATE store_info SET name = COALESCE(?1, name), address = COALESCE(?2, address), phone = COALESCE(?3, phone), currency = COALESCE(?4, currency), business_day_cutoff = COALESCE(?5, business_day_cutoff), remit_variance_tolerance = COALESCE(?6, remit_variance_tolerance), updated_at = ?7 WHERE id = 1",
    )
    .bind(&data.name)
    .bind(&data.address)
    .bind(&data.phone)
    .bind(&data.currency)
    .bind(&data.business_day_cutoff)
    .bind(data.remit_variance_tolerance)
    .bind(now)
    .execute(pool)
    .await?;

    get(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Store info missing after update".into()))
}
