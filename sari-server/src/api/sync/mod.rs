//! Sync API 模块
//!
//! 客户端实时同步：SSE 事件流 + 重连时的版本快照。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/sync/stream", get(handler::stream))
        .route("/api/sync/status", get(handler::status))
}
