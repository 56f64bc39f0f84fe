//! Audit Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::audit::{AuditAction, AuditEntry, AuditQuery};
use crate::audit::types::ChainVerification;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, time};

/// Query params (dates in business timezone)
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub action: Option<AuditAction>,
    pub resource_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/audit-log - 审计日志查询
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let tz = state.config.timezone;
    let mut audit_query = AuditQuery {
        action: query.action,
        resource_type: query.resource_type,
        limit: query.limit,
        offset: query.offset,
        ..Default::default()
    };
    if let Some(start) = &query.start_date {
        audit_query.start_millis = Some(time::day_start_millis(time::parse_date(start)?, tz));
    }
    if let Some(end) = &query.end_date {
        audit_query.end_millis = Some(time::day_end_millis(time::parse_date(end)?, tz));
    }

    let entries = state
        .audit
        .query(&audit_query)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(entries))
}

/// GET /api/audit-log/verify - 哈希链完整性校验
pub async fn verify(State(state): State<ServerState>) -> AppResult<Json<ChainVerification>> {
    let result = state
        .audit
        .verify_chain()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(result))
}
