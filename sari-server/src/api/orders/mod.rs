//! Order API 模块

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 下单/收款/完成是收银基础操作，登录即可
    let base_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/payments", post(handler::add_payment))
        .route("/{id}/complete", post(handler::complete));

    let void_routes = Router::new()
        .route("/{id}/void", post(handler::void))
        .layer(middleware::from_fn(require_permission("orders:void")));

    base_routes.merge(void_routes)
}
