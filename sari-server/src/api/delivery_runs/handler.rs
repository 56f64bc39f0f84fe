//! Delivery Run API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{delivery_run, employee, vehicle};
use crate::utils::validation::{MAX_NOTE_LEN, validate_cash, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{
    DeliveryRun, DeliveryRunCreate, DeliveryRunDetail, Order, RemitPreview, RunAssignOrder,
    RunDeliverOrder, RunExpense, RunExpenseCreate, RunStatus,
};

const RESOURCE: &str = "delivery_run";
const ORDER_RESOURCE: &str = "order";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<RunStatus>,
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    50
}

/// 在途操作 (送达/回站) 只允许批次骑手本人或 dispatch:manage
fn ensure_rider_or_manage(current_user: &CurrentUser, run: &DeliveryRun) -> AppResult<()> {
    if run.rider_id != current_user.id && !current_user.has_permission("dispatch:manage") {
        return Err(AppError::forbidden("Not your delivery run"));
    }
    Ok(())
}

async fn load_detail(state: &ServerState, id: i64) -> AppResult<DeliveryRunDetail> {
    let run = delivery_run::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Delivery run {id} not found")))?;
    let orders = delivery_run::orders_on_run(&state.pool, id).await?;
    let expenses = delivery_run::expenses(&state.pool, id).await?;
    let loadout = delivery_run::loadout(&state.pool, &run).await?;
    Ok(DeliveryRunDetail {
        run,
        orders,
        expenses,
        loadout,
    })
}

/// GET /api/delivery-runs - 批次列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DeliveryRun>>> {
    let rows =
        delivery_run::find_all(&state.pool, query.status, query.limit, query.offset).await?;
    Ok(Json(rows))
}

/// GET /api/delivery-runs/:id - 批次详情 (订单/开销/装载量)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeliveryRunDetail>> {
    let detail = load_detail(&state, id).await?;
    Ok(Json(detail))
}

/// POST /api/delivery-runs - 创建批次
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<DeliveryRunCreate>,
) -> AppResult<Json<DeliveryRun>> {
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let rider = employee::find_by_id(&state.pool, payload.rider_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Rider {} not found", payload.rider_id)))?;
    if !rider.is_rider || !rider.is_active {
        return Err(AppError::validation(format!(
            "{} is not an active rider",
            rider.display_name
        )));
    }
    let vehicle = vehicle::find_by_id(&state.pool, payload.vehicle_id)
        .await?
        .ok_or_else(|| {
            AppError::validation(format!("Vehicle {} not found", payload.vehicle_id))
        })?;
    if !vehicle.is_active {
        return Err(AppError::validation(format!(
            "Vehicle {} is inactive",
            vehicle.name
        )));
    }

    let run = delivery_run::create(
        &state.pool,
        &payload,
        &rider.display_name,
        &vehicle.name,
        current_user.id,
    )
    .await?;

    state
        .broadcast_sync(RESOURCE, "created", &run.id.to_string(), Some(&run))
        .await;

    Ok(Json(run))
}

/// POST /api/delivery-runs/:id/orders - 装单 (容量检查)
pub async fn assign_order(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<RunAssignOrder>,
) -> AppResult<Json<DeliveryRunDetail>> {
    let (updated_order, _loadout) =
        delivery_run::assign_order(&state.pool, id, payload.order_id).await?;

    state
        .broadcast_sync(
            ORDER_RESOURCE,
            "assigned",
            &updated_order.id.to_string(),
            Some(&updated_order),
        )
        .await;

    let detail = load_detail(&state, id).await?;
    Ok(Json(detail))
}

/// DELETE /api/delivery-runs/:id/orders/:order_id - 卸单
pub async fn unassign_order(
    State(state): State<ServerState>,
    Path((id, order_id)): Path<(i64, i64)>,
) -> AppResult<Json<Order>> {
    let updated = delivery_run::unassign_order(&state.pool, id, order_id).await?;

    state
        .broadcast_sync(ORDER_RESOURCE, "unassigned", &order_id.to_string(), Some(&updated))
        .await;

    Ok(Json(updated))
}

/// POST /api/delivery-runs/:id/dispatch - 发车
pub async fn dispatch_run(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DeliveryRun>> {
    let run = delivery_run::dispatch_run(&state.pool, id).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RunDispatched,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "rider": run.rider_name,
            "vehicle": run.vehicle_name,
        })
    );
    state
        .broadcast_sync(RESOURCE, "dispatched", &id_str, Some(&run))
        .await;

    Ok(Json(run))
}

/// POST /api/delivery-runs/:id/orders/:order_id/deliver - 标记送达
///
/// 可同时记录骑手代收 (COD) 现金，挂在批次上走交款结算。
pub async fn deliver_order(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path((id, order_id)): Path<(i64, i64)>,
    Json(payload): Json<RunDeliverOrder>,
) -> AppResult<Json<Order>> {
    if let Some(cod) = payload.cod_amount {
        validate_cash(cod, "cod_amount")?;
    }
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let run = delivery_run::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Delivery run {id} not found")))?;
    ensure_rider_or_manage(&current_user, &run)?;

    let updated = delivery_run::deliver_order(&state.pool, id, order_id, &payload).await?;

    state
        .broadcast_sync(ORDER_RESOURCE, "delivered", &order_id.to_string(), Some(&updated))
        .await;

    Ok(Json(updated))
}

/// POST /api/delivery-runs/:id/return - 回站
pub async fn return_run(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DeliveryRun>> {
    let run = delivery_run::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Delivery run {id} not found")))?;
    ensure_rider_or_manage(&current_user, &run)?;

    let run = delivery_run::return_run(&state.pool, id).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RunReturned,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({ "rider": run.rider_name })
    );
    state
        .broadcast_sync(RESOURCE, "returned", &id_str, Some(&run))
        .await;

    Ok(Json(run))
}

/// POST /api/delivery-runs/:id/expenses - 添加批次开销
pub async fn add_expense(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RunExpenseCreate>,
) -> AppResult<Json<RunExpense>> {
    validate_required_text(&payload.label, "label", MAX_NOTE_LEN)?;
    validate_cash(payload.amount, "amount")?;
    if payload.amount <= 0.0 {
        return Err(AppError::validation("amount must be positive"));
    }

    let expense = delivery_run::add_expense(&state.pool, id, &payload, current_user.id).await?;

    state
        .broadcast_sync(RESOURCE, "expense_added", &id.to_string(), Some(&expense))
        .await;

    Ok(Json(expense))
}

/// GET /api/delivery-runs/:id/remit-preview - 应交现金预览
pub async fn remit_preview(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RemitPreview>> {
    let preview = delivery_run::remit_preview(&state.pool, id).await?;
    Ok(Json(preview))
}
