//! Order Repository
//!
//! 订单完成是关键事务：库存扣减推断、挂账立案、状态推进
//! 在同一事务内提交或整体回滚。

use super::{RepoError, RepoResult, clearance, payment};
use crate::pricing::PricedOrder;
use crate::utils::money;
use shared::models::{
    ClearanceCase, Fulfillment, Order, OrderChannel, OrderCreate, OrderDetail, OrderItem,
    OrderStatus,
};
use sqlx::SqlitePool;

pub const ORDER_SELECT: &str = "SELECT id, channel, status, fulfillment, customer_id, customer_name, delivery_address, delivery_run_id, subtotal, discount_total, surcharge_total, total, applied_rules, note, created_by, completed_at, voided_at, void_reason, created_at, updated_at FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, product_id, name, qty, unit_price, unit_weight_kg, line_subtotal, discount, surcharge, line_total FROM order_item";

/// List filters (all optional)
#[derive(Debug, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub channel: Option<OrderChannel>,
    pub fulfillment: Option<Fulfillment>,
    pub customer_id: Option<i64>,
    pub start_millis: Option<i64>,
    pub end_millis: Option<i64>,
    pub limit: i32,
    pub offset: i32,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

pub async fn items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let items = items(pool, id).await?;
    let payments = payment::find_by_order(pool, id).await?;
    let paid = money::sum(
        payments
            .iter()
            .filter(|p| !p.cancelled)
            .map(|p| p.amount),
    );
    let balance_due = money::sub(order.total, paid);
    Ok(Some(OrderDetail {
        order,
        items,
        payments,
        balance_due,
    }))
}

pub async fn list(pool: &SqlitePool, filter: &OrderListFilter) -> RepoResult<Vec<Order>> {
    let mut sql = format!("{ORDER_SELECT} WHERE 1=1");
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.channel.is_some() {
        sql.push_str(" AND channel = ?");
    }
    if filter.fulfillment.is_some() {
        sql.push_str(" AND fulfillment = ?");
    }
    if filter.customer_id.is_some() {
        sql.push_str(" AND customer_id = ?");
    }
    if filter.start_millis.is_some() {
        sql.push_str(" AND created_at >= ?");
    }
    if filter.end_millis.is_some() {
        sql.push_str(" AND created_at < ?");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Order>(&sql);
    if let Some(v) = filter.status {
        query = query.bind(v);
    }
    if let Some(v) = filter.channel {
        query = query.bind(v);
    }
    if let Some(v) = filter.fulfillment {
        query = query.bind(v);
    }
    if let Some(v) = filter.customer_id {
        query = query.bind(v);
    }
    if let Some(v) = filter.start_millis {
        query = query.bind(v);
    }
    if let Some(v) = filter.end_millis {
        query = query.bind(v);
    }
    let rows = query
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Create order with priced line items in one transaction
pub async fn create(
    pool: &SqlitePool,
    data: &OrderCreate,
    priced: &PricedOrder,
    customer_name: Option<String>,
    created_by: i64,
) -> RepoResult<Order> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let fulfillment = match data.channel {
        OrderChannel::Delivery => Fulfillment::Pending,
        OrderChannel::Walkin => Fulfillment::None,
    };
    let applied_rules = serde_json::to_string(&priced.applied_rules)
        .map_err(|e| RepoError::Database(format!("Serialize applied_rules: {e}")))?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, channel, status, fulfillment, customer_id, customer_name, delivery_address, subtotal, discount_total, surcharge_total, total, applied_rules, note, created_by, created_at, updated_at) VALUES (?1, ?2, 'OPEN', ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
    )
    .bind(id)
    .bind(data.channel)
    .bind(fulfillment)
    .bind(data.customer_id)
    .bind(&customer_name)
    .bind(&data.delivery_address)
    .bind(priced.subtotal)
    .bind(priced.discount_total)
    .bind(priced.surcharge_total)
    .bind(priced.total)
    .bind(&applied_rules)
    .bind(&data.note)
    .bind(created_by)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for item in &priced.items {
        sqlx::query(
            "INSERT INTO order_item (id, order_id, product_id, name, qty, unit_price, unit_weight_kg, line_subtotal, discount, surcharge, line_total) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(shared::util::snowflake_id())
        .bind(id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.qty)
        .bind(item.unit_price)
        .bind(item.unit_weight_kg)
        .bind(item.line_subtotal)
        .bind(item.discount)
        .bind(item.surcharge)
        .bind(item.line_total)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

/// Complete an order.
///
/// In one transaction:
/// 1. status guard (OPEN; delivery orders must be DELIVERED)
/// 2. stock deduction inference over line items
/// 3. clearance case when a balance remains (requires a customer)
/// 4. status → COMPLETED
pub async fn complete(
    pool: &SqlitePool,
    id: i64,
) -> RepoResult<(Order, Option<ClearanceCase>)> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;

    if order.status != OrderStatus::Open {
        return Err(RepoError::BusinessRule(format!(
            "Order {id} is not open"
        )));
    }
    if order.channel == OrderChannel::Delivery && order.fulfillment != Fulfillment::Delivered {
        return Err(RepoError::BusinessRule(
            "Delivery order must be delivered before completion".into(),
        ));
    }

    // 库存扣减推断：有组件的商品扣组件库存，否则扣自身
    let item_sql = format!("{ITEM_SELECT} WHERE order_id = ?");
    let order_items = sqlx::query_as::<_, OrderItem>(&item_sql)
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

    for item in &order_items {
        let product: Option<(bool, i64, Option<i64>, i64)> = sqlx::query_as(
            "SELECT track_stock, stock_qty, component_product_id, component_qty FROM product WHERE id = ?",
        )
        .bind(item.product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((track_stock, _, component_product_id, component_qty)) = product else {
            return Err(RepoError::Database(format!(
                "Product {} missing for order item",
                item.product_id
            )));
        };

        let (deduct_id, deduct_qty) = match component_product_id {
            Some(component_id) => (component_id, item.qty * component_qty),
            None if track_stock => (item.product_id, item.qty),
            None => continue,
        };

        let rows = sqlx::query(
            "UPDATE product SET stock_qty = stock_qty - ?1, updated_at = ?2 WHERE id = ?3 AND track_stock = 1 AND stock_qty >= ?1",
        )
        .bind(deduct_qty)
        .bind(now)
        .bind(deduct_id)
        .execute(&mut *tx)
        .await?;

        if rows.rows_affected() == 0 {
            // Either the target doesn't track stock (component may not) or
            // stock is insufficient — distinguish for the error message
            let tracked: Option<bool> =
                sqlx::query_scalar("SELECT track_stock FROM product WHERE id = ?")
                    .bind(deduct_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if tracked == Some(true) {
                return Err(RepoError::BusinessRule(format!(
                    "Insufficient stock for '{}'",
                    item.name
                )));
            }
        }
    }

    // 挂账：有余额必须有客户，否则拒绝完成
    let paid = payment::paid_total_tx(&mut *tx, id).await?;
    let balance = money::sub(order.total, paid);
    let case = if balance > 0.0 && !money::is_zero(balance) {
        let Some(customer_id) = order.customer_id else {
            return Err(RepoError::BusinessRule(
                "Order has an unpaid balance and no customer account".into(),
            ));
        };
        let customer_name = order.customer_name.clone().unwrap_or_default();
        Some(clearance::create_tx(&mut *tx, id, customer_id, &customer_name, balance, now).await?)
    } else {
        None
    };

    sqlx::query(
        "UPDATE orders SET status = 'COMPLETED', completed_at = ?1, updated_at = ?1 WHERE id = ?2",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let order = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;
    Ok((order, case))
}

/// Void an open order (not while out on a dispatched run)
pub async fn void(pool: &SqlitePool, id: i64, reason: &str) -> RepoResult<Order> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;

    if order.status != OrderStatus::Open {
        return Err(RepoError::BusinessRule(format!("Order {id} is not open")));
    }
    if order.fulfillment == Fulfillment::Dispatched {
        return Err(RepoError::BusinessRule(
            "Order is out on a dispatched run".into(),
        ));
    }

    // Detach from any run so the loadout stays accurate
    sqlx::query(
        "UPDATE orders SET status = 'VOIDED', voided_at = ?1, void_reason = ?2, delivery_run_id = NULL, updated_at = ?1 WHERE id = ?3",
    )
    .bind(now)
    .bind(reason)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}
