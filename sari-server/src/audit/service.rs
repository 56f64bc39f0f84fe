//! 审计日志服务
//!
//! 写入走后台 worker (mpsc)，请求路径只做一次非阻塞 send，
//! 查询与校验直读存储层。

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::storage::{AuditStorage, AuditStorageResult};
use super::types::{AuditAction, AuditEntry, AuditQuery, ChainVerification};

/// 待写入的审计条目
#[derive(Debug)]
struct PendingEntry {
    timestamp: i64,
    action: AuditAction,
    resource_type: String,
    resource_id: String,
    operator_id: Option<i64>,
    operator_name: Option<String>,
    details: serde_json::Value,
}

/// 审计日志服务
#[derive(Debug)]
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::UnboundedSender<PendingEntry>,
}

impl AuditService {
    /// 启动服务：spawn 后台写入 worker
    pub fn start(pool: SqlitePool) -> Self {
        let storage = AuditStorage::new(pool);
        let (tx, mut rx) = mpsc::unbounded_channel::<PendingEntry>();

        let worker_storage = storage.clone();
        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = worker_storage
                    .append(
                        entry.timestamp,
                        entry.action,
                        &entry.resource_type,
                        &entry.resource_id,
                        entry.operator_id,
                        entry.operator_name.as_deref(),
                        entry.details,
                    )
                    .await
                {
                    tracing::error!(target: "audit", "Failed to write audit entry: {e}");
                }
            }
            tracing::debug!(target: "audit", "Audit worker stopped");
        });

        Self { storage, tx }
    }

    /// 记录一条审计日志（非阻塞）
    pub fn log(
        &self,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        operator_id: Option<i64>,
        operator_name: Option<String>,
        details: serde_json::Value,
    ) {
        let entry = PendingEntry {
            timestamp: shared::util::now_millis(),
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            operator_id,
            operator_name,
            details,
        };
        if self.tx.send(entry).is_err() {
            tracing::error!(target: "audit", "Audit worker unavailable, entry dropped");
        }
    }

    /// 查询审计记录
    pub async fn query(&self, query: &AuditQuery) -> AuditStorageResult<Vec<AuditEntry>> {
        self.storage.query(query).await
    }

    /// 校验哈希链
    pub async fn verify_chain(&self) -> AuditStorageResult<ChainVerification> {
        self.storage.verify_chain().await
    }
}
