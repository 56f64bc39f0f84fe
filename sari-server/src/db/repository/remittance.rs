//! Remittance Repository
//!
//! 骑手交款：应交金额在事务内重算（批次代收现金 − 批次开销），
//! 交款与批次结清 (SETTLED) 原子提交；run_id UNIQUE 防止重复交款。

use super::{RepoError, RepoResult, delivery_run};
use crate::utils::money;
use shared::models::{DeliveryRun, Remittance, RemittanceCreate, RunStatus};
use sqlx::SqlitePool;

const REMIT_SELECT: &str = "SELECT id, run_id, rider_id, rider_name, expected_amount, remitted_amount, variance, note, received_by, created_at FROM remittance";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Remittance>> {
    let sql = format!("{REMIT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Remittance>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_run(pool: &SqlitePool, run_id: i64) -> RepoResult<Option<Remittance>> {
    let sql = format!("{REMIT_SELECT} WHERE run_id = ?");
    let row = sqlx::query_as::<_, Remittance>(&sql)
        .bind(run_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_date_range(
    pool: &SqlitePool,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<Remittance>> {
    let sql = format!(
        "{REMIT_SELECT} WHERE created_at >= ? AND created_at < ? ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Remittance>(&sql)
        .bind(start_millis)
        .bind(end_millis)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_all(pool: &SqlitePool, limit: i32, offset: i32) -> RepoResult<Vec<Remittance>> {
    let sql = format!("{REMIT_SELECT} ORDER BY created_at DESC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Remittance>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Record the rider's remittance and settle the run.
///
/// `tolerance` comes from store settings: a variance beyond it requires a
/// note explaining the shortage/overage.
pub async fn create(
    pool: &SqlitePool,
    data: &RemittanceCreate,
    received_by: i64,
    tolerance: f64,
) -> RepoResult<Remittance> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let run_sql = "SELECT id, rider_id, rider_name, vehicle_id, vehicle_name, status, note, dispatched_at, returned_at, settled_at, created_by, created_at, updated_at FROM delivery_run WHERE id = ?";
    let run = sqlx::query_as::<_, DeliveryRun>(run_sql)
        .bind(data.run_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {} not found", data.run_id)))?;

    match run.status {
        RunStatus::Returned => {}
        RunStatus::Settled => {
            return Err(RepoError::Duplicate(format!(
                "Run {} has already been remitted",
                data.run_id
            )));
        }
        _ => {
            return Err(RepoError::BusinessRule(format!(
                "Run {} must return before remittance",
                data.run_id
            )));
        }
    }

    let preview = delivery_run::remit_preview_tx(&mut *tx, data.run_id).await?;
    let expected = preview.cash_to_remit;
    let variance = money::sub(data.remitted_amount, expected);

    if variance.abs() > tolerance + 0.005 {
        let has_note = data.note.as_deref().is_some_and(|n| !n.trim().is_empty());
        if !has_note {
            return Err(RepoError::BusinessRule(format!(
                "Variance {variance:.2} exceeds tolerance {tolerance:.2}; a note is required"
            )));
        }
    }

    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO remittance (id, run_id, rider_id, rider_name, expected_amount, remitted_amount, variance, note, received_by, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(id)
    .bind(data.run_id)
    .bind(run.rider_id)
    .bind(&run.rider_name)
    .bind(expected)
    .bind(data.remitted_amount)
    .bind(variance)
    .bind(&data.note)
    .bind(received_by)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "Run {} has already been remitted",
            data.run_id
        )),
        other => other,
    })?;

    sqlx::query(
        "UPDATE delivery_run SET status = 'SETTLED', settled_at = ?1, updated_at = ?1 WHERE id = ?2",
    )
    .bind(now)
    .bind(data.run_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record remittance".into()))
}
