//! Clearance Case Repository
//!
//! 挂账清收：订单带余额完成时自动立案，经理收款或核销结案。

use super::{RepoError, RepoResult, shift};
use crate::utils::money;
use shared::models::{
    ClearanceCase, ClearanceSettle, ClearanceStatus, Payment, PaymentMethod,
};
use sqlx::SqlitePool;

const CASE_SELECT: &str = "SELECT id, order_id, customer_id, customer_name, amount_original, amount_outstanding, status, resolved_by, resolution_note, resolved_at, created_at, updated_at FROM clearance_case";

const BALANCE_EPSILON: f64 = 0.005;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ClearanceCase>> {
    let sql = format!("{CASE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, ClearanceCase>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<ClearanceCase>> {
    let sql = format!("{CASE_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, ClearanceCase>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Manager review queue
pub async fn find_all(
    pool: &SqlitePool,
    status: Option<ClearanceStatus>,
) -> RepoResult<Vec<ClearanceCase>> {
    let rows = match status {
        Some(status) => {
            let sql = format!("{CASE_SELECT} WHERE status = ? ORDER BY created_at DESC");
            sqlx::query_as::<_, ClearanceCase>(&sql)
                .bind(status)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{CASE_SELECT} ORDER BY created_at DESC");
            sqlx::query_as::<_, ClearanceCase>(&sql).fetch_all(pool).await?
        }
    };
    Ok(rows)
}

/// Open a case on the caller's transaction (order completion path)
pub async fn create_tx(
    conn: &mut sqlx::SqliteConnection,
    order_id: i64,
    customer_id: i64,
    customer_name: &str,
    amount: f64,
    now: i64,
) -> RepoResult<ClearanceCase> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO clearance_case (id, order_id, customer_id, customer_name, amount_original, amount_outstanding, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5, 'OPEN', ?6, ?6)",
    )
    .bind(id)
    .bind(order_id)
    .bind(customer_id)
    .bind(customer_name)
    .bind(amount)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let sql = format!("{CASE_SELECT} WHERE id = ?");
    let case = sqlx::query_as::<_, ClearanceCase>(&sql)
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(case)
}

/// Collect cash/card against the case.
///
/// Records a payment on the underlying order and reduces the outstanding
/// amount in one transaction; reaching zero settles the case. CASH goes
/// into the collecting operator's open shift drawer.
pub async fn settle(
    pool: &SqlitePool,
    id: i64,
    data: &ClearanceSettle,
    operator_id: i64,
    operator_name: &str,
) -> RepoResult<(ClearanceCase, Payment)> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let sql = format!("{CASE_SELECT} WHERE id = ?");
    let case = sqlx::query_as::<_, ClearanceCase>(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Clearance case {id} not found")))?;

    if case.status != ClearanceStatus::Open {
        return Err(RepoError::BusinessRule(format!(
            "Clearance case {id} is already resolved"
        )));
    }
    if data.amount > case.amount_outstanding + BALANCE_EPSILON {
        return Err(RepoError::Validation(format!(
            "Amount {:.2} exceeds outstanding {:.2}",
            data.amount, case.amount_outstanding
        )));
    }

    // Drawer handling mirrors counter payments
    let shift_id = match data.method {
        PaymentMethod::Cash => {
            let open_shift: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM shift WHERE status = 'OPEN' AND operator_id = ?",
            )
            .bind(operator_id)
            .fetch_optional(&mut *tx)
            .await?;
            let Some(shift_id) = open_shift else {
                return Err(RepoError::BusinessRule(
                    "Open a shift before accepting cash".into(),
                ));
            };
            shift::add_cash_payment_tx(&mut *tx, shift_id, data.amount, now).await?;
            Some(shift_id)
        }
        _ => None,
    };

    let payment_id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payment (id, order_id, method, amount, shift_id, operator_id, operator_name, cancelled, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9)",
    )
    .bind(payment_id)
    .bind(case.order_id)
    .bind(data.method)
    .bind(data.amount)
    .bind(shift_id)
    .bind(operator_id)
    .bind(operator_name)
    .bind(&data.note)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let outstanding = money::sub(case.amount_outstanding, data.amount);
    if money::is_zero(outstanding) {
        sqlx::query(
            "UPDATE clearance_case SET amount_outstanding = 0, status = 'SETTLED', resolved_by = ?1, resolution_note = COALESCE(?2, resolution_note), resolved_at = ?3, updated_at = ?3 WHERE id = ?4",
        )
        .bind(operator_id)
        .bind(&data.note)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query(
            "UPDATE clearance_case SET amount_outstanding = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(outstanding)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let case = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Clearance case {id} not found")))?;
    let payment = super::payment::find_by_id(pool, payment_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record clearance payment".into()))?;
    Ok((case, payment))
}

/// Write off the remaining balance (manager decision, note required)
pub async fn write_off(
    pool: &SqlitePool,
    id: i64,
    note: &str,
    operator_id: i64,
) -> RepoResult<ClearanceCase> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE clearance_case SET status = 'WRITTEN_OFF', resolved_by = ?1, resolution_note = ?2, resolved_at = ?3, updated_at = ?3 WHERE id = ?4 AND status = 'OPEN'",
    )
    .bind(operator_id)
    .bind(note)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Clearance case {id} not found or already resolved"
        )));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Clearance case {id} not found")))
}
