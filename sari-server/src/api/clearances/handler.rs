//! Clearance API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::clearance;
use crate::utils::validation::{MAX_NOTE_LEN, validate_cash, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{
    ClearanceCase, ClearanceSettle, ClearanceStatus, ClearanceWriteOff, Payment,
};

const RESOURCE: &str = "clearance_case";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ClearanceStatus>,
}

#[derive(Debug, Serialize)]
pub struct SettleResponse {
    #[serde(flatten)]
    pub case: ClearanceCase,
    pub payment: Payment,
}

/// GET /api/clearances - 挂账审核队列
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ClearanceCase>>> {
    let rows = clearance::find_all(&state.pool, query.status).await?;
    Ok(Json(rows))
}

/// GET /api/clearances/:id - 单个挂账
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ClearanceCase>> {
    let row = clearance::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Clearance case {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/clearances/:id/settle - 收款
///
/// 同一事务内在订单上记一笔支付并扣减欠款，清零即结案。
pub async fn settle(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ClearanceSettle>,
) -> AppResult<Json<SettleResponse>> {
    validate_cash(payload.amount, "amount")?;
    if payload.amount <= 0.0 {
        return Err(AppError::validation("amount must be positive"));
    }
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let (case, payment) = clearance::settle(
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
        AuditAction::ClearanceSettled,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "amount": payload.amount,
            "method": payload.method,
            "outstanding": case.amount_outstanding,
            "status": case.status,
        })
    );
    state
        .broadcast_sync(RESOURCE, "settled", &id_str, Some(&case))
        .await;

    Ok(Json(SettleResponse { case, payment }))
}

/// POST /api/clearances/:id/write-off - 核销
pub async fn write_off(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ClearanceWriteOff>,
) -> AppResult<Json<ClearanceCase>> {
    validate_required_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let case = clearance::write_off(&state.pool, id, payload.note.trim(), current_user.id).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::ClearanceWrittenOff,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "note": payload.note.trim(),
            "amount_written_off": case.amount_outstanding,
        })
    );
    state
        .broadcast_sync(RESOURCE, "written_off", &id_str, Some(&case))
        .await;

    Ok(Json(case))
}
