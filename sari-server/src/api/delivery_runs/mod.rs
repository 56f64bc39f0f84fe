//! Delivery Run API 模块

mod handler;

use axum::{Router, middleware, routing::delete, routing::get, routing::post};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/delivery-runs", routes())
}

fn routes() -> Router<ServerState> {
    // 读 + 骑手在途操作 (deliver/return 在 handler 里校验骑手本人或
    // dispatch:manage)
    let base_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/remit-preview", get(handler::remit_preview))
        .route("/{id}/orders/{order_id}/deliver", post(handler::deliver_order))
        .route("/{id}/return", post(handler::return_run));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}/orders", post(handler::assign_order))
        .route("/{id}/orders/{order_id}", delete(handler::unassign_order))
        .route("/{id}/dispatch", post(handler::dispatch_run))
        .route("/{id}/expenses", post(handler::add_expense))
        .layer(middleware::from_fn(require_permission("dispatch:manage")));

    base_routes.merge(manage_routes)
}
