//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::category;
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

const RESOURCE: &str = "category";

/// GET /api/categories - 分类列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let rows = category::find_all(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/categories/:id - 获取单个分类
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let row = category::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/categories - 创建分类
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let created = category::create(&state.pool, &payload).await?;

    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;

    Ok(Json(created))
}

/// PUT /api/categories/:id - 更新分类
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;

    let updated = category::update(&state.pool, id, &payload).await?;

    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;

    Ok(Json(updated))
}

/// DELETE /api/categories/:id - 删除分类 (无商品引用时)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = category::delete(&state.pool, id).await?;
    if result {
        state
            .broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None)
            .await;
    }
    Ok(Json(result))
}
