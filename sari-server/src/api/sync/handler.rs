//! Sync API Handlers

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::SyncStatus;

/// GET /api/sync/stream - SSE 事件流
///
/// 每次资源变更推送一条 `sync` 事件；慢速客户端落后超过通道容量时
/// 丢弃过期消息 (Lagged)，客户端应据版本号重新拉取。
pub async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe_sync();
    let stream = BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(payload) => Event::default()
                .event("sync")
                .json_data(&payload)
                .ok()
                .map(Ok),
            // Lagged: 跳过，客户端通过版本号发现缺口
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/sync/status - 各资源当前版本快照 (重连检查)
pub async fn status(State(state): State<ServerState>) -> AppResult<Json<SyncStatus>> {
    Ok(Json(SyncStatus {
        versions: state.resource_versions.snapshot(),
    }))
}
