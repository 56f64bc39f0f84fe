//! Shift Repository

use super::{RepoError, RepoResult};
use shared::models::{Shift, ShiftClose, ShiftCreate, ShiftForceClose, ShiftUpdate};
use sqlx::SqlitePool;

const SHIFT_SELECT: &str = "SELECT id, operator_id, operator_name, status, start_time, end_time, starting_cash, expected_cash, actual_cash, cash_variance, abnormal_close, last_active_at, note, created_at, updated_at FROM shift";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Shift>> {
    let sql = format!("{SHIFT_SELECT} WHERE id = ?");
    let shift = sqlx::query_as::<_, Shift>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(shift)
}

/// The operator's currently OPEN shift, if any
pub async fn find_open_by_operator(
    pool: &SqlitePool,
    operator_id: i64,
) -> RepoResult<Option<Shift>> {
    let sql = format!("{SHIFT_SELECT} WHERE status = 'OPEN' AND operator_id = ?");
    let shift = sqlx::query_as::<_, Shift>(&sql)
        .bind(operator_id)
        .fetch_optional(pool)
        .await?;
    Ok(shift)
}

pub async fn find_all_open(pool: &SqlitePool) -> RepoResult<Vec<Shift>> {
    let sql = format!("{SHIFT_SELECT} WHERE status = 'OPEN' ORDER BY start_time");
    let shifts = sqlx::query_as::<_, Shift>(&sql).fetch_all(pool).await?;
    Ok(shifts)
}

pub async fn create(
    pool: &SqlitePool,
    operator_id: i64,
    operator_name: &str,
    data: ShiftCreate,
) -> RepoResult<Shift> {
    // Pre-check for a friendly message; the partial UNIQUE index
    // (idx_shift_open_per_operator) is the actual guarantee under races
    if find_open_by_operator(pool, operator_id).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "{operator_name} already has an open shift"
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO shift (id, operator_id, operator_name, status, start_time, starting_cash, expected_cash, abnormal_close, last_active_at, note, created_at, updated_at) VALUES (?1, ?2, ?3, 'OPEN', ?4, ?5, ?5, 0, ?4, ?6, ?4, ?4)",
    )
    .bind(id)
    .bind(operator_id)
    .bind(operator_name)
    .bind(now)
    .bind(data.starting_cash)
    .bind(&data.note)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "{operator_name} already has an open shift"
        )),
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create shift".into()))
}

pub async fn find_all(pool: &SqlitePool, limit: i32, offset: i32) -> RepoResult<Vec<Shift>> {
    let sql = format!("{SHIFT_SELECT} ORDER BY start_time DESC LIMIT ? OFFSET ?");
    let shifts = sqlx::query_as::<_, Shift>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(shifts)
}

pub async fn find_by_date_range(
    pool: &SqlitePool,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<Shift>> {
    let sql = format!(
        "{SHIFT_SELECT} WHERE start_time >= ? AND start_time < ? ORDER BY start_time DESC"
    );
    let shifts = sqlx::query_as::<_, Shift>(&sql)
        .bind(start_millis)
        .bind(end_millis)
        .fetch_all(pool)
        .await?;
    Ok(shifts)
}

pub async fn update(pool: &SqlitePool, id: i64, data: ShiftUpdate) -> RepoResult<Shift> {
    let now = shared::util::now_millis();

    // When starting_cash changes, adjust expected_cash accordingly
    let rows = sqlx::query(
        "UPDATE shift SET starting_cash = COALESCE(?1, starting_cash), expected_cash = CASE WHEN ?1 IS NOT NULL THEN ?1 + (expected_cash - starting_cash) ELSE expected_cash END, note = COALESCE(?2, note), last_active_at = ?3, updated_at = ?3 WHERE id = ?4 AND status = 'OPEN'",
    )
    .bind(data.starting_cash)
    .bind(&data.note)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Shift {id} not found or already closed"
        )));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shift {id} not found")))
}

pub async fn close(pool: &SqlitePool, id: i64, data: ShiftClose) -> RepoResult<Shift> {
    let now = shared::util::now_millis();

    // Atomic: compute cash_variance = actual_cash - expected_cash in SQL
    let rows = sqlx::query(
        "UPDATE shift SET status = 'CLOSED', end_time = ?1, actual_cash = ?2, cash_variance = (?2 - expected_cash), abnormal_close = 0, note = COALESCE(?3, note), last_active_at = ?1, updated_at = ?1 WHERE id = ?4 AND status = 'OPEN'",
    )
    .bind(now)
    .bind(data.actual_cash)
    .bind(&data.note)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Shift {id} not found or already closed"
        )));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shift {id} not found")))
}

pub async fn force_close(pool: &SqlitePool, id: i64, data: ShiftForceClose) -> RepoResult<Shift> {
    let now = shared::util::now_millis();
    let note = data
        .note
        .as_deref()
        .unwrap_or("Force closed without cash counting");

    let rows = sqlx::query(
        "UPDATE shift SET status = 'CLOSED', end_time = ?1, abnormal_close = 1, note = ?2, last_active_at = ?1, updated_at = ?1 WHERE id = ?3 AND status = 'OPEN'",
    )
    .bind(now)
    .bind(note)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Shift {id} not found or already closed"
        )));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Shift {id} not found")))
}

/// OPEN shifts that started before the current business day
pub async fn find_stale_shifts(
    pool: &SqlitePool,
    business_day_start: i64,
) -> RepoResult<Vec<Shift>> {
    let sql = format!("{SHIFT_SELECT} WHERE status = 'OPEN' AND start_time < ?");
    let shifts = sqlx::query_as::<_, Shift>(&sql)
        .bind(business_day_start)
        .fetch_all(pool)
        .await?;
    Ok(shifts)
}

/// Bump expected_cash for a counter cash payment.
///
/// Runs on the caller's connection so payment insert and drawer update
/// commit together.
pub async fn add_cash_payment_tx(
    conn: &mut sqlx::SqliteConnection,
    shift_id: i64,
    amount: f64,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE shift SET expected_cash = expected_cash + ?1, last_active_at = ?2, updated_at = ?2 WHERE id = ?3 AND status = 'OPEN'",
    )
    .bind(amount)
    .bind(now)
    .bind(shift_id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::BusinessRule(format!(
            "Shift {shift_id} is not open"
        )));
    }
    Ok(())
}

pub async fn heartbeat(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE shift SET last_active_at = ? WHERE id = ? AND status = 'OPEN'")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
