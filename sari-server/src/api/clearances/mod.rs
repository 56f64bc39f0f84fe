//! Clearance API 模块

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/clearances", routes())
}

fn routes() -> Router<ServerState> {
    // 挂账清收整体是经理审核流程
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/settle", post(handler::settle))
        .route("/{id}/write-off", post(handler::write_off))
        .layer(middleware::from_fn(require_permission("clearance:manage")))
}
