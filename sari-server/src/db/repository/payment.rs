//! Payment Repository
//!
//! 柜台现金进收银班次钱箱 (shift_id)，骑手代收现金挂配送批次
//! (delivery_run_id)，两者互斥。同一事务内写入支付并更新钱箱预期现金。

use super::{RepoError, RepoResult, shift};
use crate::utils::money;
use shared::models::{Payment, PaymentCreate, PaymentMethod};
use sqlx::SqlitePool;

const PAYMENT_SELECT: &str = "SELECT id, order_id, method, amount, tendered, change_amount, shift_id, delivery_run_id, operator_id, operator_name, cancelled, cancel_reason, note, created_at FROM payment";

/// Overpay tolerance: half a centavo absorbs decimal round-trips
const BALANCE_EPSILON: f64 = 0.005;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ? ORDER BY created_at");
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Non-cancelled payment total for an order, on the caller's connection
pub async fn paid_total_tx(
    conn: &mut sqlx::SqliteConnection,
    order_id: i64,
) -> RepoResult<f64> {
    let total: Option<f64> = sqlx::query_scalar(
        "SELECT SUM(amount) FROM payment WHERE order_id = ? AND cancelled = 0",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(money::round_cash(total.unwrap_or(0.0)))
}

/// Record a counter payment on an open order.
///
/// CASH requires the operator to have an OPEN shift; the payment amount is
/// added to that shift's expected_cash in the same transaction.
pub async fn add_payment(
    pool: &SqlitePool,
    order_id: i64,
    data: &PaymentCreate,
    operator_id: i64,
    operator_name: &str,
) -> RepoResult<Payment> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let order: Option<(String, f64)> =
        sqlx::query_as("SELECT status, total FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((status, total)) = order else {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    };
    if status != "OPEN" {
        return Err(RepoError::BusinessRule(format!(
            "Order {order_id} is not open"
        )));
    }

    let paid = paid_total_tx(&mut *tx, order_id).await?;
    let balance = money::sub(total, paid);
    if data.amount > balance + BALANCE_EPSILON {
        return Err(RepoError::Validation(format!(
            "Payment {:.2} exceeds balance due {balance:.2}",
            data.amount
        )));
    }

    // Cash specifics: tendered/change + drawer update
    let (tendered, change_amount, shift_id) = match data.method {
        PaymentMethod::Cash => {
            let tendered = data.tendered.unwrap_or(data.amount);
            if tendered + BALANCE_EPSILON < data.amount {
                return Err(RepoError::Validation(format!(
                    "Tendered {tendered:.2} is less than payment amount {:.2}",
                    data.amount
                )));
            }
            let change = money::sub(tendered, data.amount);

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

            (Some(tendered), Some(change), Some(shift_id))
        }
        _ => (None, None, None),
    };

    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payment (id, order_id, method, amount, tendered, change_amount, shift_id, operator_id, operator_name, cancelled, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)",
    )
    .bind(id)
    .bind(order_id)
    .bind(data.method)
    .bind(data.amount)
    .bind(tendered)
    .bind(change_amount)
    .bind(shift_id)
    .bind(operator_id)
    .bind(operator_name)
    .bind(&data.note)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record payment".into()))
}

/// Record rider-collected COD cash on the caller's transaction.
///
/// Tagged to the delivery run (settles through remittance), never a shift.
pub async fn add_cod_cash_tx(
    conn: &mut sqlx::SqliteConnection,
    order_id: i64,
    run_id: i64,
    amount: f64,
    rider_id: i64,
    rider_name: &str,
    now: i64,
) -> RepoResult<i64> {
    let order: Option<f64> = sqlx::query_scalar("SELECT total FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(total) = order else {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    };

    let paid = paid_total_tx(&mut *conn, order_id).await?;
    let balance = money::sub(total, paid);
    if amount > balance + BALANCE_EPSILON {
        return Err(RepoError::Validation(format!(
            "COD amount {amount:.2} exceeds balance due {balance:.2}"
        )));
    }

    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payment (id, order_id, method, amount, delivery_run_id, operator_id, operator_name, cancelled, created_at) VALUES (?1, ?2, 'CASH', ?3, ?4, ?5, ?6, 0, ?7)",
    )
    .bind(id)
    .bind(order_id)
    .bind(amount)
    .bind(run_id)
    .bind(rider_id)
    .bind(rider_name)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(id)
}
