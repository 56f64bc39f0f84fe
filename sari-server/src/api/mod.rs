//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`employees`] - 员工/骑手管理接口
//! - [`roles`] - 角色管理接口
//! - [`customers`] - 客户管理接口
//! - [`vehicles`] - 车辆管理接口
//! - [`categories`] - 分类管理接口
//! - [`products`] - 商品管理接口
//! - [`orders`] - 订单管理接口
//! - [`shifts`] - 班次管理接口
//! - [`price_rules`] - 价格规则管理接口
//! - [`delivery_runs`] - 配送批次接口
//! - [`remittances`] - 骑手交款接口
//! - [`clearances`] - 挂账清收接口
//! - [`store_info`] - 门店信息接口
//! - [`audit_log`] - 审计日志接口
//! - [`sync`] - 客户端同步接口

pub mod auth;
pub mod health;
pub mod sync;

// Parties & assets
pub mod customers;
pub mod employees;
pub mod roles;
pub mod vehicles;

// Catalog
pub mod categories;
pub mod products;

// Orders & money
pub mod orders;
pub mod price_rules;
pub mod shifts;

// Dispatch & settlement
pub mod clearances;
pub mod delivery_runs;
pub mod remittances;

// System
pub mod audit_log;
pub mod store_info;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(employees::router())
        .merge(roles::router())
        .merge(customers::router())
        .merge(vehicles::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(shifts::router())
        .merge(price_rules::router())
        .merge(delivery_runs::router())
        .merge(remittances::router())
        .merge(clearances::router())
        .merge(store_info::router())
        .merge(audit_log::router())
        .merge(sync::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
