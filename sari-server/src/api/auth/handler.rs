//! Auth API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::employee;
use crate::security_log;
use crate::utils::validation::{MAX_PASSWORD_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::PasswordChange;

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response: token + profile
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub employee_id: i64,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// POST /api/auth/login - 登录 (无需认证)
///
/// 用户名枚举防护：用户不存在/密码错误/账号停用统一返回
/// "Invalid username or password"。
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_required_text(&payload.username, "username", 100)?;
    validate_required_text(&payload.password, "password", MAX_PASSWORD_LEN)?;

    let auth = employee::find_auth_by_username(&state.pool, &payload.username).await?;

    let Some(auth) = auth else {
        security_log!("WARN", "login_failed", username = payload.username.clone());
        audit_log!(
            state.audit,
            AuditAction::LoginFailed,
            "employee",
            &payload.username,
            operator_id = None,
            operator_name = None,
            details = serde_json::json!({ "reason": "unknown_user" })
        );
        return Err(AppError::invalid_credentials());
    };

    if !crate::auth::verify_password(&payload.password, &auth.password_hash) || !auth.is_active {
        security_log!("WARN", "login_failed", username = payload.username.clone());
        audit_log!(
            state.audit,
            AuditAction::LoginFailed,
            "employee",
            &auth.id.to_string(),
            operator_id = Some(auth.id),
            operator_name = Some(auth.display_name.clone()),
            details = serde_json::json!({ "reason": "bad_credentials_or_inactive" })
        );
        return Err(AppError::invalid_credentials());
    }

    let token = state
        .jwt_service
        .generate_token(
            auth.id,
            &auth.username,
            &auth.display_name,
            &auth.role_name,
            &auth.permissions,
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    security_log!("INFO", "login_success", username = auth.username.clone());
    audit_log!(
        state.audit,
        AuditAction::LoginSuccess,
        "employee",
        &auth.id.to_string(),
        operator_id = Some(auth.id),
        operator_name = Some(auth.display_name.clone()),
        details = serde_json::json!({})
    );

    let permissions: Vec<String> = auth
        .permissions
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    Ok(Json(LoginResponse {
        token,
        employee_id: auth.id,
        username: auth.username,
        display_name: auth.display_name,
        role: auth.role_name,
        permissions,
    }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(current_user: CurrentUser) -> AppResult<Json<CurrentUser>> {
    Ok(Json(current_user))
}

/// POST /api/auth/change-password - 修改自己的密码
pub async fn change_password(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<PasswordChange>,
) -> AppResult<Json<bool>> {
    validate_required_text(&payload.new_password, "new_password", MAX_PASSWORD_LEN)?;
    if payload.new_password.len() < 8 {
        return Err(AppError::validation(
            "New password must be at least 8 characters",
        ));
    }

    let hash = employee::find_password_hash(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    if !crate::auth::verify_password(&payload.old_password, &hash) {
        return Err(AppError::invalid_credentials());
    }

    let new_hash = crate::auth::hash_password(&payload.new_password)?;
    employee::set_password(&state.pool, current_user.id, &new_hash).await?;

    security_log!(
        "INFO",
        "password_changed",
        username = current_user.username.clone()
    );

    Ok(Json(true))
}
