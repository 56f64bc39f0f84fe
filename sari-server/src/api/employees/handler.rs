//! Employee API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::audit::{AuditAction, create_diff};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{employee, role};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{EmployeeCreate, EmployeeResponse, EmployeeUpdate};

const RESOURCE: &str = "employee";

/// GET /api/employees - 员工列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<EmployeeResponse>>> {
    let rows = employee::find_all(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/employees/riders - 可派单骑手列表
pub async fn list_riders(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<EmployeeResponse>>> {
    let rows = employee::find_riders(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/employees/:id - 获取单个员工
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<EmployeeResponse>> {
    let row = employee::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Employee {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/employees - 创建员工
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<EmployeeCreate>,
) -> AppResult<Json<EmployeeResponse>> {
    validate_required_text(&payload.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.password, "password", MAX_PASSWORD_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    if payload.password.len() < 8 {
        return Err(AppError::validation("Password must be at least 8 characters"));
    }
    role::find_by_id(&state.pool, payload.role_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("Role {} not found", payload.role_id)))?;

    let hash = crate::auth::hash_password(&payload.password)?;
    let created = employee::create(&state.pool, &payload, &hash).await?;

    let id = created.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::EmployeeCreated,
        RESOURCE,
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "username": created.username,
            "role_id": created.role_id,
            "is_rider": created.is_rider,
        })
    );
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&created))
        .await;

    Ok(Json(created))
}

/// PUT /api/employees/:id - 更新员工
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeUpdate>,
) -> AppResult<Json<EmployeeResponse>> {
    validate_optional_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    if let Some(role_id) = payload.role_id {
        role::find_by_id(&state.pool, role_id)
            .await?
            .ok_or_else(|| AppError::validation(format!("Role {role_id} not found")))?;
    }
    let password_hash = match &payload.password {
        Some(pw) => {
            if pw.len() < 8 {
                return Err(AppError::validation(
                    "Password must be at least 8 characters",
                ));
            }
            Some(crate::auth::hash_password(pw)?)
        }
        None => None,
    };

    let old = employee::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Employee {id} not found")))?;

    let updated = employee::update(&state.pool, id, &payload, password_hash).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::EmployeeUpdated,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old, &updated, RESOURCE)
    );
    state
        .broadcast_sync(RESOURCE, "updated", &id_str, Some(&updated))
        .await;

    Ok(Json(updated))
}

/// DELETE /api/employees/:id - 停用员工 (软删除)
pub async fn deactivate(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if id == current_user.id {
        return Err(AppError::business_rule("Cannot deactivate your own account"));
    }

    let result = employee::deactivate(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::EmployeeUpdated,
            RESOURCE,
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = serde_json::json!({ "is_active": false })
        );
        state
            .broadcast_sync::<()>(RESOURCE, "deactivated", &id_str, None)
            .await;
    }

    Ok(Json(result))
}
