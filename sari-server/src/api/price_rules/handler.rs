//! Price Rule API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{price_rule, product};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_RECEIPT_NAME_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{AdjustmentType, PriceRule, PriceRuleCreate, PriceRuleUpdate, ProductScope};

const RESOURCE: &str = "price_rule";

fn validate_adjustment(adjustment_type: AdjustmentType, value: f64) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation("adjustment_value must be positive"));
    }
    if adjustment_type == AdjustmentType::Percentage && value > 100.0 {
        return Err(AppError::validation(
            "Percentage adjustment cannot exceed 100",
        ));
    }
    Ok(())
}

fn validate_target(scope: ProductScope, target_id: Option<i64>) -> AppResult<()> {
    match scope {
        ProductScope::Global if target_id.is_some() => Err(AppError::validation(
            "GLOBAL rules must not have a target_id",
        )),
        ProductScope::Category | ProductScope::Product if target_id.is_none() => Err(
            AppError::validation("CATEGORY/PRODUCT rules require a target_id"),
        ),
        _ => Ok(()),
    }
}

fn validate_window(valid_from: Option<i64>, valid_until: Option<i64>) -> AppResult<()> {
    if let (Some(from), Some(until)) = (valid_from, valid_until)
        && from > until
    {
        return Err(AppError::validation("valid_from is after valid_until"));
    }
    Ok(())
}

/// GET /api/price-rules - 获取所有价格规则
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<PriceRule>>> {
    let rules = price_rule::find_all(&state.pool).await?;
    Ok(Json(rules))
}

/// GET /api/price-rules/:id - 获取单个价格规则
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PriceRule>> {
    let rule = price_rule::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Price rule {} not found", id)))?;
    Ok(Json(rule))
}

/// GET /api/price-rules/for-product/:product_id - 适用于商品的激活规则
pub async fn list_for_product(
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<PriceRule>>> {
    let product = product::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
    let rules = price_rule::find_for_product(&state.pool, &product).await?;
    Ok(Json(rules))
}

/// POST /api/price-rules - 创建价格规则
///
/// 互斥规则与同作用域的激活互斥规则时间窗重叠时返回 409。
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(mut payload): Json<PriceRuleCreate>,
) -> AppResult<Json<PriceRule>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.receipt_name, "receipt_name", MAX_RECEIPT_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_adjustment(payload.adjustment_type, payload.adjustment_value)?;
    validate_target(payload.product_scope, payload.target_id)?;
    validate_window(payload.valid_from, payload.valid_until)?;
    payload.created_by = Some(current_user.id);

    let rule = price_rule::create(&state.pool, payload).await?;

    let id = rule.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::PriceRuleChanged,
        RESOURCE,
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "action": "created",
            "name": rule.name,
            "rule_type": rule.rule_type,
            "adjustment_value": rule.adjustment_value,
        })
    );
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&rule))
        .await;

    Ok(Json(rule))
}

/// PUT /api/price-rules/:id - 更新价格规则
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PriceRuleUpdate>,
) -> AppResult<Json<PriceRule>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.receipt_name, "receipt_name", MAX_RECEIPT_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let (Some(adjustment_type), Some(value)) = (payload.adjustment_type, payload.adjustment_value)
    {
        validate_adjustment(adjustment_type, value)?;
    }
    validate_window(payload.valid_from, payload.valid_until)?;

    let old = price_rule::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Price rule {id} not found")))?;

    let rule = price_rule::update(&state.pool, id, payload).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::PriceRuleChanged,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = crate::audit::create_diff(&old, &rule, RESOURCE)
    );
    state
        .broadcast_sync(RESOURCE, "updated", &id_str, Some(&rule))
        .await;

    Ok(Json(rule))
}

/// DELETE /api/price-rules/:id - 删除价格规则 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = price_rule::delete(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::PriceRuleChanged,
            RESOURCE,
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = serde_json::json!({ "action": "deactivated" })
        );
        state
            .broadcast_sync::<()>(RESOURCE, "deleted", &id_str, None)
            .await;
    }

    Ok(Json(result))
}
