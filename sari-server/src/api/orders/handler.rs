//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order::OrderListFilter;
use crate::db::repository::{customer, order, payment};
use crate::pricing::PriceRuleEngine;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NOTE_LEN, validate_cash, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, time};
use shared::models::{
    Fulfillment, Order, OrderChannel, OrderCreate, OrderDetail, OrderStatus, OrderVoid, Payment,
    PaymentCreate,
};

const RESOURCE: &str = "order";

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub channel: Option<OrderChannel>,
    pub fulfillment: Option<Fulfillment>,
    pub customer_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    50
}

/// GET /api/orders - 订单列表 (可按状态/渠道/客户/日期过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let tz = state.config.timezone;
    let mut filter = OrderListFilter {
        status: query.status,
        channel: query.channel,
        fulfillment: query.fulfillment,
        customer_id: query.customer_id,
        limit: query.limit,
        offset: query.offset,
        ..Default::default()
    };
    if let Some(start) = &query.start_date {
        filter.start_millis = Some(time::day_start_millis(time::parse_date(start)?, tz));
    }
    if let Some(end) = &query.end_date {
        filter.end_millis = Some(time::day_end_millis(time::parse_date(end)?, tz));
    }

    let rows = order::list(&state.pool, &filter).await?;
    Ok(Json(rows))
}

/// GET /api/orders/:id - 订单详情 (含行项目与支付)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = order::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(Json(detail))
}

/// POST /api/orders - 创建订单 (定价引擎在此运行)
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.delivery_address, "delivery_address", MAX_ADDRESS_LEN)?;

    // 配送单必须有客户和地址
    let customer_name = match payload.channel {
        OrderChannel::Delivery => {
            let Some(customer_id) = payload.customer_id else {
                return Err(AppError::validation("Delivery orders require a customer"));
            };
            let customer = customer::find_by_id(&state.pool, customer_id)
                .await?
                .ok_or_else(|| {
                    AppError::validation(format!("Customer {customer_id} not found"))
                })?;
            let has_address = payload
                .delivery_address
                .as_deref()
                .map(str::trim)
                .is_some_and(|a| !a.is_empty())
                || customer.address.is_some();
            if !has_address {
                return Err(AppError::validation(
                    "Delivery orders require a delivery address",
                ));
            }
            Some(customer.name)
        }
        OrderChannel::Walkin => match payload.customer_id {
            Some(customer_id) => customer::find_by_id(&state.pool, customer_id)
                .await?
                .map(|c| c.name),
            None => None,
        },
    };

    let priced = PriceRuleEngine::price_order(
        &state.pool,
        &payload.items,
        payload.channel,
        state.config.timezone,
    )
    .await?;

    let created = order::create(
        &state.pool,
        &payload,
        &priced,
        customer_name,
        current_user.id,
    )
    .await?;

    let id = created.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::OrderCreated,
        RESOURCE,
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "channel": created.channel,
            "total": created.total,
            "items": priced.items.len(),
        })
    );
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&created))
        .await;

    Ok(Json(created))
}

/// POST /api/orders/:id/payments - 记录柜台支付
pub async fn add_payment(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<Payment>> {
    validate_cash(payload.amount, "amount")?;
    if payload.amount <= 0.0 {
        return Err(AppError::validation("amount must be positive"));
    }
    if let Some(tendered) = payload.tendered {
        validate_cash(tendered, "tendered")?;
    }
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let p = payment::add_payment(
        &state.pool,
        id,
        &payload,
        current_user.id,
        &current_user.display_name,
    )
    .await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::OrderPaymentAdded,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "payment_id": p.id,
            "method": p.method,
            "amount": p.amount,
            "shift_id": p.shift_id,
        })
    );
    state
        .broadcast_sync(RESOURCE, "payment_added", &id_str, Some(&p))
        .await;

    Ok(Json(p))
}

/// POST /api/orders/:id/complete - 完成订单
///
/// 同一事务内执行库存扣减推断；有余额时开挂账立案。
pub async fn complete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let (completed, case) = order::complete(&state.pool, id).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::OrderCompleted,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "total": completed.total,
            "clearance_case": case.as_ref().map(|c| c.id),
        })
    );
    state
        .broadcast_sync(RESOURCE, "completed", &id_str, Some(&completed))
        .await;
    if let Some(case) = &case {
        state
            .broadcast_sync("clearance_case", "created", &case.id.to_string(), Some(case))
            .await;
    }

    let detail = order::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(Json(detail))
}

/// POST /api/orders/:id/void - 作废订单
pub async fn void(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderVoid>,
) -> AppResult<Json<Order>> {
    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;

    let voided = order::void(&state.pool, id, payload.reason.trim()).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::OrderVoided,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "reason": payload.reason.trim(),
            "total": voided.total,
        })
    );
    state
        .broadcast_sync(RESOURCE, "voided", &id_str, Some(&voided))
        .await;

    Ok(Json(voided))
}
