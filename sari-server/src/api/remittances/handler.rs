//! Remittance API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{remittance, store_info};
use crate::utils::validation::{MAX_NOTE_LEN, validate_cash, validate_optional_text};
use crate::utils::{AppError, AppResult, time};
use shared::models::{Remittance, RemittanceCreate};

const RESOURCE: &str = "remittance";
const RUN_RESOURCE: &str = "delivery_run";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
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

/// GET /api/remittances - 交款记录 (可按日期范围)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Remittance>>> {
    let tz = state.config.timezone;
    let rows = if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        let start_date = time::parse_date(&start)?;
        let end_date = time::parse_date(&end)?;
        remittance::find_by_date_range(
            &state.pool,
            time::day_start_millis(start_date, tz),
            time::day_end_millis(end_date, tz),
        )
        .await
    } else {
        remittance::find_all(&state.pool, query.limit, query.offset).await
    }?;

    Ok(Json(rows))
}

/// GET /api/remittances/:id - 单条交款记录
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Remittance>> {
    let row = remittance::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Remittance {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/remittances - 记录骑手交款并结清批次
///
/// 应交金额在事务内按批次代收现金 − 开销重算；超容差差异必须附说明。
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<RemittanceCreate>,
) -> AppResult<Json<Remittance>> {
    validate_cash(payload.remitted_amount, "remitted_amount")?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let tolerance = store_info::get(&state.pool)
        .await?
        .map(|s| s.remit_variance_tolerance)
        .unwrap_or(0.0);

    let remit = remittance::create(&state.pool, &payload, current_user.id, tolerance).await?;

    let id = remit.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RemittanceRecorded,
        RESOURCE,
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "run_id": remit.run_id,
            "rider": remit.rider_name,
            "expected_amount": remit.expected_amount,
            "remitted_amount": remit.remitted_amount,
            "variance": remit.variance,
        })
    );
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&remit))
        .await;
    state
        .broadcast_sync::<()>(RUN_RESOURCE, "settled", &remit.run_id.to_string(), None)
        .await;

    Ok(Json(remit))
}
