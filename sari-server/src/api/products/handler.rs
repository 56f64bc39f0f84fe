//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::audit::AuditAction;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::product;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_cash, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{Product, ProductCreate, ProductUpdate, StockAdjust};

const RESOURCE: &str = "product";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

fn validate_weight(weight: f64) -> AppResult<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(AppError::validation("unit_weight_kg must be non-negative"));
    }
    Ok(())
}

/// GET /api/products - 商品列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let rows = product::find_all(&state.pool, query.include_inactive).await?;
    Ok(Json(rows))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let row = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/products - 创建商品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_cash(payload.price, "price")?;
    validate_weight(payload.unit_weight_kg)?;
    if payload.component_qty <= 0 {
        return Err(AppError::validation("component_qty must be positive"));
    }

    let created = product::create(&state.pool, &payload).await?;

    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;

    Ok(Json(created))
}

/// PUT /api/products/:id - 更新商品
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if let Some(price) = payload.price {
        validate_cash(price, "price")?;
    }
    if let Some(weight) = payload.unit_weight_kg {
        validate_weight(weight)?;
    }
    if let Some(qty) = payload.component_qty
        && qty <= 0
    {
        return Err(AppError::validation("component_qty must be positive"));
    }

    let updated = product::update(&state.pool, id, &payload).await?;

    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;

    Ok(Json(updated))
}

/// POST /api/products/:id/stock - 手工库存调整
pub async fn adjust_stock(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<StockAdjust>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    if payload.delta == 0 {
        return Err(AppError::validation("delta must be non-zero"));
    }

    let updated = product::adjust_stock(&state.pool, id, payload.delta).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::StockAdjusted,
        RESOURCE,
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = serde_json::json!({
            "delta": payload.delta,
            "reason": payload.reason,
            "stock_qty": updated.stock_qty,
        })
    );
    state
        .broadcast_sync(RESOURCE, "stock_adjusted", &id_str, Some(&updated))
        .await;

    Ok(Json(updated))
}
