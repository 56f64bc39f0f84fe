//! Role API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::auth::permissions::{ALL_PERMISSIONS, validate_permissions};
use crate::core::ServerState;
use crate::db::repository::role;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Role, RoleCreate, RoleUpdate};

const RESOURCE: &str = "role";

/// GET /api/roles - 角色列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Role>>> {
    let rows = role::find_all(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/roles/permissions - 可配置权限列表
pub async fn list_permissions() -> AppResult<Json<Vec<&'static str>>> {
    Ok(Json(ALL_PERMISSIONS.to_vec()))
}

/// POST /api/roles - 创建角色
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<Role>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_permissions(&payload.permissions).map_err(AppError::validation)?;

    let created = role::create(&state.pool, payload).await?;

    let id = created.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RoleChanged,
        RESOURCE,
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "action": "created",
            "name": created.name,
            "permissions": created.permissions,
        })
    );
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&created))
        .await;

    Ok(Json(created))
}

/// PUT /api/roles/:id - 更新角色 (系统角色拒绝)
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<Role>> {
    if let Some(perms) = &payload.permissions {
        validate_permissions(perms).map_err(AppError::validation)?;
    }

    let updated = role::update(&state.pool, id, payload).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::RoleChanged,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "action": "updated",
            "permissions": updated.permissions,
        })
    );
    state
        .broadcast_sync(RESOURCE, "updated", &id_str, Some(&updated))
        .await;

    Ok(Json(updated))
}

/// DELETE /api/roles/:id - 删除角色 (无员工引用时)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = role::delete(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::RoleChanged,
            RESOURCE,
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = serde_json::json!({ "action": "deleted" })
        );
        state
            .broadcast_sync::<()>(RESOURCE, "deleted", &id_str, None)
            .await;
    }

    Ok(Json(result))
}
