//! Customer API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::customer;
use crate::utils::phone::normalize_phone;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

const RESOURCE: &str = "customer";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    50
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/customers - 客户列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let rows = customer::find_all(&state.pool, query.limit, query.offset).await?;
    Ok(Json(rows))
}

/// GET /api/customers/search?q= - 按姓名/电话/地址搜索
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let rows = customer::search(&state.pool, query.q.trim()).await?;
    Ok(Json(rows))
}

/// GET /api/customers/:id - 获取单个客户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Customer>> {
    let row = customer::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/customers - 创建客户
///
/// 手机号先规范化再入库；UNIQUE 索引保证同号唯一 (409)。
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    let phone = normalize_phone(&payload.phone)?;

    let created = customer::create(&state.pool, &payload, &phone).await?;

    let id = created.id.to_string();
    state
        .broadcast_sync(RESOURCE, "created", &id, Some(&created))
        .await;

    Ok(Json(created))
}

/// PUT /api/customers/:id - 更新客户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    let phone = match &payload.phone {
        Some(raw) => Some(normalize_phone(raw)?),
        None => None,
    };

    let updated = customer::update(&state.pool, id, &payload, phone).await?;

    let id_str = id.to_string();
    state
        .broadcast_sync(RESOURCE, "updated", &id_str, Some(&updated))
        .await;

    Ok(Json(updated))
}

/// DELETE /api/customers/:id - 停用客户 (软删除)
pub async fn deactivate(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = customer::deactivate(&state.pool, id).await?;
    if result {
        state
            .broadcast_sync::<()>(RESOURCE, "deactivated", &id.to_string(), None)
            .await;
    }
    Ok(Json(result))
}
