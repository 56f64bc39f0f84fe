//! Employee API 模块

mod handler;

use axum::{Router, middleware, routing::get, routing::post, routing::put};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/employees", routes())
}

fn routes() -> Router<ServerState> {
    // 骑手列表配送页要用，登录即可读
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/riders", get(handler::list_riders))
        .route("/{id}", get(handler::get_by_id));

    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::deactivate))
        .layer(middleware::from_fn(require_permission("users:manage")));

    read_routes.merge(write_routes)
}
