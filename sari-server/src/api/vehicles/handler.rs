//! Vehicle API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::vehicle;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{Vehicle, VehicleCreate, VehicleUpdate};

const RESOURCE: &str = "vehicle";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
}

fn validate_capacity(max_load_kg: f64, max_stops: i64) -> AppResult<()> {
    if !max_load_kg.is_finite() || max_load_kg <= 0.0 {
        return Err(AppError::validation("max_load_kg must be positive"));
    }
    if max_stops <= 0 {
        return Err(AppError::validation("max_stops must be positive"));
    }
    Ok(())
}

/// GET /api/vehicles - 车辆列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let rows = if query.active_only {
        vehicle::find_active(&state.pool).await?
    } else {
        vehicle::find_all(&state.pool).await?
    };
    Ok(Json(rows))
}

/// GET /api/vehicles/:id - 获取单辆车
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vehicle>> {
    let row = vehicle::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Vehicle {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/vehicles - 创建车辆
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<VehicleCreate>,
) -> AppResult<Json<Vehicle>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.plate_no, "plate_no", MAX_SHORT_TEXT_LEN)?;
    validate_capacity(payload.max_load_kg, payload.max_stops)?;

    let created = vehicle::create(&state.pool, &payload).await?;

    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;

    Ok(Json(created))
}

/// PUT /api/vehicles/:id - 更新车辆
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<VehicleUpdate>,
) -> AppResult<Json<Vehicle>> {
    if let Some(load) = payload.max_load_kg
        && (!load.is_finite() || load <= 0.0)
    {
        return Err(AppError::validation("max_load_kg must be positive"));
    }
    if let Some(stops) = payload.max_stops
        && stops <= 0
    {
        return Err(AppError::validation("max_stops must be positive"));
    }

    let updated = vehicle::update(&state.pool, id, &payload).await?;

    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;

    Ok(Json(updated))
}
