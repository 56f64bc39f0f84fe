//! Delivery Run Repository
//!
//! 配送批次状态机：OPEN → DISPATCHED → RETURNED → SETTLED。
//! 装载量检查在装单和发车两处执行 (容量只增不减的路径都要拦)。

use super::{RepoError, RepoResult, order, payment};
use crate::dispatch;
use crate::utils::money;
use shared::models::{
    DeliveryRun, DeliveryRunCreate, Fulfillment, Order, RemitPreview, RunDeliverOrder,
    RunExpense, RunExpenseCreate, RunLoadout, RunStatus, Vehicle,
};
use sqlx::SqlitePool;

const RUN_SELECT: &str = "SELECT id, rider_id, rider_name, vehicle_id, vehicle_name, status, note, dispatched_at, returned_at, settled_at, created_by, created_at, updated_at FROM delivery_run";

const EXPENSE_SELECT: &str =
    "SELECT id, run_id, label, amount, created_by, created_at FROM run_expense";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DeliveryRun>> {
    let sql = format!("{RUN_SELECT} WHERE id = ?");
    let run = sqlx::query_as::<_, DeliveryRun>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(run)
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<RunStatus>,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<DeliveryRun>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "{RUN_SELECT} WHERE status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
            );
            sqlx::query_as::<_, DeliveryRun>(&sql)
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{RUN_SELECT} ORDER BY created_at DESC LIMIT ? OFFSET ?");
            sqlx::query_as::<_, DeliveryRun>(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn orders_on_run(pool: &SqlitePool, run_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{} WHERE delivery_run_id = ? ORDER BY created_at", order::ORDER_SELECT);
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(run_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn expenses(pool: &SqlitePool, run_id: i64) -> RepoResult<Vec<RunExpense>> {
    let sql = format!("{EXPENSE_SELECT} WHERE run_id = ? ORDER BY created_at");
    let rows = sqlx::query_as::<_, RunExpense>(&sql)
        .bind(run_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Current loadout of a run on the caller's connection
async fn loadout_tx(
    conn: &mut sqlx::SqliteConnection,
    run_id: i64,
    vehicle: &Vehicle,
) -> RepoResult<RunLoadout> {
    let (weight, stops): (Option<f64>, i64) = sqlx::query_as(
        "SELECT SUM(oi.qty * oi.unit_weight_kg), COUNT(DISTINCT o.id) FROM orders o LEFT JOIN order_item oi ON oi.order_id = o.id WHERE o.delivery_run_id = ? AND o.status = 'OPEN'",
    )
    .bind(run_id)
    .fetch_one(conn)
    .await?;
    Ok(dispatch::loadout(vehicle, weight.unwrap_or(0.0), stops))
}

/// Loadout summary for API responses
pub async fn loadout(pool: &SqlitePool, run: &DeliveryRun) -> RepoResult<RunLoadout> {
    let vehicle = super::vehicle::find_by_id(pool, run.vehicle_id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Vehicle {} missing", run.vehicle_id)))?;
    let mut conn = pool.acquire().await?;
    loadout_tx(&mut *conn, run.id, &vehicle).await
}

/// Create an OPEN run. One unsettled run per rider and per vehicle.
pub async fn create(
    pool: &SqlitePool,
    data: &DeliveryRunCreate,
    rider_name: &str,
    vehicle_name: &str,
    created_by: i64,
) -> RepoResult<DeliveryRun> {
    let rider_busy: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM delivery_run WHERE rider_id = ? AND status != 'SETTLED'",
    )
    .bind(data.rider_id)
    .fetch_one(pool)
    .await?;
    if rider_busy > 0 {
        return Err(RepoError::Duplicate(format!(
            "{rider_name} already has an unsettled run"
        )));
    }
    let vehicle_busy: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM delivery_run WHERE vehicle_id = ? AND status != 'SETTLED'",
    )
    .bind(data.vehicle_id)
    .fetch_one(pool)
    .await?;
    if vehicle_busy > 0 {
        return Err(RepoError::Duplicate(format!(
            "Vehicle {vehicle_name} is already on an unsettled run"
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO delivery_run (id, rider_id, rider_name, vehicle_id, vehicle_name, status, note, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 'OPEN', ?6, ?7, ?8, ?8)",
    )
    .bind(id)
    .bind(data.rider_id)
    .bind(rider_name)
    .bind(data.vehicle_id)
    .bind(vehicle_name)
    .bind(&data.note)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create delivery run".into()))
}

/// Assign a pending delivery order, enforcing the capacity check
pub async fn assign_order(
    pool: &SqlitePool,
    run_id: i64,
    order_id: i64,
) -> RepoResult<(Order, RunLoadout)> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let run_sql = format!("{RUN_SELECT} WHERE id = ?");
    let run = sqlx::query_as::<_, DeliveryRun>(&run_sql)
        .bind(run_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))?;
    if run.status != RunStatus::Open {
        return Err(RepoError::BusinessRule(format!(
            "Run {run_id} is not open for loading"
        )));
    }

    let vehicle = sqlx::query_as::<_, Vehicle>(
        "SELECT id, name, plate_no, max_load_kg, max_stops, is_active, created_at, updated_at FROM vehicle WHERE id = ?",
    )
    .bind(run.vehicle_id)
    .fetch_one(&mut *tx)
    .await?;

    let order_sql = format!("{} WHERE id = ?", order::ORDER_SELECT);
    let target = sqlx::query_as::<_, Order>(&order_sql)
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;

    if target.status != shared::models::OrderStatus::Open {
        return Err(RepoError::BusinessRule(format!("Order {order_id} is not open")));
    }
    if target.channel != shared::models::OrderChannel::Delivery {
        return Err(RepoError::BusinessRule(format!(
            "Order {order_id} is not a delivery order"
        )));
    }
    if !matches!(target.fulfillment, Fulfillment::Pending | Fulfillment::Returned) {
        return Err(RepoError::BusinessRule(format!(
            "Order {order_id} is not awaiting dispatch"
        )));
    }

    // Capacity: current loadout + this order must fit
    let current = loadout_tx(&mut *tx, run_id, &vehicle).await?;
    let add_weight: Option<f64> = sqlx::query_scalar(
        "SELECT SUM(qty * unit_weight_kg) FROM order_item WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;
    let candidate = dispatch::loadout(
        &vehicle,
        dispatch::add_weight_kg(current.total_weight_kg, add_weight.unwrap_or(0.0)),
        current.stops + 1,
    );
    dispatch::check_capacity(&candidate)
        .map_err(|e| RepoError::BusinessRule(e.to_string()))?;

    sqlx::query(
        "UPDATE orders SET delivery_run_id = ?1, fulfillment = 'ASSIGNED', updated_at = ?2 WHERE id = ?3",
    )
    .bind(run_id)
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let updated = order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;
    let run = find_by_id(pool, run_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))?;
    let loadout = loadout(pool, &run).await?;
    Ok((updated, loadout))
}

/// Remove an order from an OPEN run
pub async fn unassign_order(pool: &SqlitePool, run_id: i64, order_id: i64) -> RepoResult<Order> {
    let now = shared::util::now_millis();

    let run = find_by_id(pool, run_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))?;
    if run.status != RunStatus::Open {
        return Err(RepoError::BusinessRule(format!(
            "Run {run_id} is not open for loading"
        )));
    }

    let rows = sqlx::query(
        "UPDATE orders SET delivery_run_id = NULL, fulfillment = 'PENDING', updated_at = ?1 WHERE id = ?2 AND delivery_run_id = ?3",
    )
    .bind(now)
    .bind(order_id)
    .bind(run_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Order {order_id} is not on run {run_id}"
        )));
    }

    order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))
}

/// Dispatch the run: re-validate capacity, push all assigned orders out
pub async fn dispatch_run(pool: &SqlitePool, run_id: i64) -> RepoResult<DeliveryRun> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let run_sql = format!("{RUN_SELECT} WHERE id = ?");
    let run = sqlx::query_as::<_, DeliveryRun>(&run_sql)
        .bind(run_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))?;
    if run.status != RunStatus::Open {
        return Err(RepoError::BusinessRule(format!(
            "Run {run_id} has already been dispatched"
        )));
    }

    let vehicle = sqlx::query_as::<_, Vehicle>(
        "SELECT id, name, plate_no, max_load_kg, max_stops, is_active, created_at, updated_at FROM vehicle WHERE id = ?",
    )
    .bind(run.vehicle_id)
    .fetch_one(&mut *tx)
    .await?;

    let current = loadout_tx(&mut *tx, run_id, &vehicle).await?;
    if current.stops == 0 {
        return Err(RepoError::BusinessRule(
            "Cannot dispatch an empty run".into(),
        ));
    }
    dispatch::check_capacity(&current)
        .map_err(|e| RepoError::BusinessRule(e.to_string()))?;

    sqlx::query(
        "UPDATE orders SET fulfillment = 'DISPATCHED', updated_at = ?1 WHERE delivery_run_id = ?2 AND fulfillment = 'ASSIGNED'",
    )
    .bind(now)
    .bind(run_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE delivery_run SET status = 'DISPATCHED', dispatched_at = ?1, updated_at = ?1 WHERE id = ?2",
    )
    .bind(now)
    .bind(run_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, run_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))
}

/// Mark one order delivered, optionally recording rider-collected COD cash
pub async fn deliver_order(
    pool: &SqlitePool,
    run_id: i64,
    order_id: i64,
    data: &RunDeliverOrder,
) -> RepoResult<Order> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let run_sql = format!("{RUN_SELECT} WHERE id = ?");
    let run = sqlx::query_as::<_, DeliveryRun>(&run_sql)
        .bind(run_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))?;
    if run.status != RunStatus::Dispatched {
        return Err(RepoError::BusinessRule(format!(
            "Run {run_id} is not on the road"
        )));
    }

    let rows = sqlx::query(
        "UPDATE orders SET fulfillment = 'DELIVERED', updated_at = ?1 WHERE id = ?2 AND delivery_run_id = ?3 AND fulfillment = 'DISPATCHED'",
    )
    .bind(now)
    .bind(order_id)
    .bind(run_id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::BusinessRule(format!(
            "Order {order_id} is not out for delivery on run {run_id}"
        )));
    }

    if let Some(cod) = data.cod_amount
        && cod > 0.0
    {
        payment::add_cod_cash_tx(
            &mut *tx,
            order_id,
            run_id,
            cod,
            run.rider_id,
            &run.rider_name,
            now,
        )
        .await?;
    }

    tx.commit().await?;

    order::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))
}

/// Run returns to the store; undelivered orders become RETURNED
pub async fn return_run(pool: &SqlitePool, run_id: i64) -> RepoResult<DeliveryRun> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE delivery_run SET status = 'RETURNED', returned_at = ?1, updated_at = ?1 WHERE id = ?2 AND status = 'DISPATCHED'",
    )
    .bind(now)
    .bind(run_id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::BusinessRule(format!(
            "Run {run_id} is not on the road"
        )));
    }

    // Undelivered orders come back; they stay attached for the remit
    // preview counts and re-attach to a new run on reassignment
    sqlx::query(
        "UPDATE orders SET fulfillment = 'RETURNED', updated_at = ?1 WHERE delivery_run_id = ?2 AND fulfillment = 'DISPATCHED'",
    )
    .bind(now)
    .bind(run_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, run_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))
}

/// Add a run expense (deducted from cash-to-remit)
pub async fn add_expense(
    pool: &SqlitePool,
    run_id: i64,
    data: &RunExpenseCreate,
    created_by: i64,
) -> RepoResult<RunExpense> {
    let run = find_by_id(pool, run_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Delivery run {run_id} not found")))?;
    if run.status == RunStatus::Settled {
        return Err(RepoError::BusinessRule(format!(
            "Run {run_id} is already settled"
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO run_expense (id, run_id, label, amount, created_by, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(run_id)
    .bind(&data.label)
    .bind(data.amount)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("{EXPENSE_SELECT} WHERE id = ?");
    let expense = sqlx::query_as::<_, RunExpense>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(expense)
}

/// Cash-to-remit computation for a run
pub async fn remit_preview(pool: &SqlitePool, run_id: i64) -> RepoResult<RemitPreview> {
    let mut conn = pool.acquire().await?;
    remit_preview_tx(&mut *conn, run_id).await
}

/// Same computation on the caller's connection (remittance transaction)
pub async fn remit_preview_tx(
    conn: &mut sqlx::SqliteConnection,
    run_id: i64,
) -> RepoResult<RemitPreview> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM delivery_run WHERE id = ?")
        .bind(run_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists == 0 {
        return Err(RepoError::NotFound(format!(
            "Delivery run {run_id} not found"
        )));
    }

    let cod: Option<f64> = sqlx::query_scalar(
        "SELECT SUM(amount) FROM payment WHERE delivery_run_id = ? AND method = 'CASH' AND cancelled = 0",
    )
    .bind(run_id)
    .fetch_one(&mut *conn)
    .await?;
    let expense: Option<f64> =
        sqlx::query_scalar("SELECT SUM(amount) FROM run_expense WHERE run_id = ?")
            .bind(run_id)
            .fetch_one(&mut *conn)
            .await?;
    let (delivered, returned): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(CASE WHEN fulfillment = 'DELIVERED' THEN 1 END), COUNT(CASE WHEN fulfillment = 'RETURNED' THEN 1 END) FROM orders WHERE delivery_run_id = ?",
    )
    .bind(run_id)
    .fetch_one(&mut *conn)
    .await?;

    let cod_collected = money::round_cash(cod.unwrap_or(0.0));
    let expense_total = money::round_cash(expense.unwrap_or(0.0));
    Ok(RemitPreview {
        run_id,
        cod_collected,
        expense_total,
        cash_to_remit: money::sub(cod_collected, expense_total),
        delivered_orders: delivered,
        returned_orders: returned,
    })
}
