//! Sync Model
//!
//! 客户端实时同步载荷：每次资源变更后服务器广播一条 SyncPayload，
//! 版本号按资源类型单调递增，客户端据此判断数据新旧。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resource change notification broadcast to connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource type ("order", "shift", "delivery_run", ...)
    pub resource: String,
    /// Per-resource monotonically increasing version
    pub version: u64,
    /// Change type ("created", "updated", "deleted", domain actions)
    pub action: String,
    pub id: String,
    /// Resource data (None for deletions)
    pub data: Option<serde_json::Value>,
}

/// 同步状态响应
///
/// 用于客户端重连时检查资源版本
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    /// 各资源类型的当前版本
    pub versions: HashMap<String, u64>,
}
