//! Shift API 模块

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/shifts", routes())
}

fn routes() -> Router<ServerState> {
    // 开班/收班/心跳是收银员基础操作；收他人班次在 handler 里查
    // shifts:manage 权限
    let base_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/current", get(handler::get_current))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/close", post(handler::close))
        .route("/{id}/heartbeat", post(handler::heartbeat));

    let manage_routes = Router::new()
        .route("/{id}/force-close", post(handler::force_close))
        .route("/recover", post(handler::recover_stale))
        .layer(middleware::from_fn(require_permission("shifts:manage")));

    base_routes.merge(manage_routes)
}
