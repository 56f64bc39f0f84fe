//! Store Info API Handlers

use axum::{Json, extract::State};

use crate::audit::{AuditAction, create_diff};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::store_info;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{StoreInfo, StoreInfoUpdate};

const RESOURCE: &str = "store_info";

/// GET /api/store-info - 门店信息
pub async fn get(State(state): State<ServerState>) -> AppResult<Json<StoreInfo>> {
    let info = store_info::ensure_exists(&state.pool).await?;
    Ok(Json(info))
}

/// PUT /api/store-info - 更新门店信息
///
/// business_day_cutoff 变更通过 config_notify 唤醒班次调度器重算。
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<StoreInfoUpdate>,
) -> AppResult<Json<StoreInfo>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    if let Some(cutoff) = &payload.business_day_cutoff
        && chrono::NaiveTime::parse_from_str(cutoff, "%H:%M").is_err()
    {
        return Err(AppError::validation(format!(
            "Invalid business_day_cutoff '{cutoff}', expected HH:MM"
        )));
    }
    if let Some(tolerance) = payload.remit_variance_tolerance
        && (!tolerance.is_finite() || tolerance < 0.0)
    {
        return Err(AppError::validation(
            "remit_variance_tolerance must be non-negative",
        ));
    }
    if let Some(currency) = &payload.currency
        && currency.len() != 3
    {
        return Err(AppError::validation("currency must be an ISO 4217 code"));
    }

    let old = store_info::ensure_exists(&state.pool).await?;
    let cutoff_changed = payload
        .business_day_cutoff
        .as_ref()
        .is_some_and(|c| c != &old.business_day_cutoff);

    let updated = store_info::update(&state.pool, &payload).await?;

    audit_log!(
        state.audit,
        AuditAction::StoreInfoChanged,
        RESOURCE,
        "1",
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old, &updated, RESOURCE)
    );
    state
        .broadcast_sync(RESOURCE, "updated", "1", Some(&updated))
        .await;

    // 营业日分界变更 → 班次调度器立即重算
    if cutoff_changed {
        state.config_notify.notify_waiters();
    }

    Ok(Json(updated))
}
