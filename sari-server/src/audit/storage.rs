//! 审计日志 SQLite 存储层
//!
//! Append-only 设计，没有任何删除/更新接口。
//! SHA256 哈希链确保防篡改。

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use super::types::{AuditAction, AuditEntry, AuditQuery, ChainVerification};

/// 创世哈希 (链首 prev_hash)
const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

const ENTRY_SELECT: &str = "SELECT id, timestamp, action, resource_type, resource_id, operator_id, operator_name, details, prev_hash, curr_hash FROM audit_log";

/// 存储错误
#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AuditStorageError {
    fn from(err: sqlx::Error) -> Self {
        AuditStorageError::Database(err.to_string())
    }
}

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

/// 条目内容哈希：prev_hash + 不可变字段的规范串
fn entry_hash(
    prev_hash: &str,
    timestamp: i64,
    action: AuditAction,
    resource_type: &str,
    resource_id: &str,
    operator_id: Option<i64>,
    operator_name: Option<&str>,
    details: &str,
) -> AuditStorageResult<String> {
    let action_str = serde_json::to_string(&action)?;
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.to_le_bytes());
    hasher.update(action_str.as_bytes());
    hasher.update(resource_type.as_bytes());
    hasher.update(resource_id.as_bytes());
    hasher.update(operator_id.unwrap_or(0).to_le_bytes());
    hasher.update(operator_name.unwrap_or("").as_bytes());
    hasher.update(details.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// 审计日志存储
#[derive(Debug, Clone)]
pub struct AuditStorage {
    pool: SqlitePool,
}

impl AuditStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 追加一条审计记录（哈希链尾部）
    ///
    /// 单写事务内读取链尾并插入，保证链的连续性。
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        timestamp: i64,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        operator_id: Option<i64>,
        operator_name: Option<&str>,
        details: serde_json::Value,
    ) -> AuditStorageResult<()> {
        let details_str = serde_json::to_string(&details)?;

        let mut tx = self.pool.begin().await?;

        let prev_hash: Option<String> =
            sqlx::query_scalar("SELECT curr_hash FROM audit_log ORDER BY id DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;
        let prev_hash = prev_hash.unwrap_or_else(|| GENESIS_HASH.to_string());

        let curr_hash = entry_hash(
            &prev_hash,
            timestamp,
            action,
            resource_type,
            resource_id,
            operator_id,
            operator_name,
            &details_str,
        )?;

        sqlx::query(
            "INSERT INTO audit_log (timestamp, action, resource_type, resource_id, operator_id, operator_name, details, prev_hash, curr_hash) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(timestamp)
        .bind(action)
        .bind(resource_type)
        .bind(resource_id)
        .bind(operator_id)
        .bind(operator_name)
        .bind(&details_str)
        .bind(&prev_hash)
        .bind(&curr_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// 查询审计记录（倒序）
    pub async fn query(&self, query: &AuditQuery) -> AuditStorageResult<Vec<AuditEntry>> {
        let mut sql = format!("{ENTRY_SELECT} WHERE 1=1");
        if query.action.is_some() {
            sql.push_str(" AND action = ?");
        }
        if query.resource_type.is_some() {
            sql.push_str(" AND resource_type = ?");
        }
        if query.start_millis.is_some() {
            sql.push_str(" AND timestamp >= ?");
        }
        if query.end_millis.is_some() {
            sql.push_str(" AND timestamp < ?");
        }
        sql.push_str(" ORDER BY id DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, AuditEntry>(&sql);
        if let Some(action) = query.action {
            q = q.bind(action);
        }
        if let Some(rt) = &query.resource_type {
            q = q.bind(rt.clone());
        }
        if let Some(start) = query.start_millis {
            q = q.bind(start);
        }
        if let Some(end) = query.end_millis {
            q = q.bind(end);
        }
        let rows = q
            .bind(query.limit.unwrap_or(100))
            .bind(query.offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// 全链校验：逐条重算哈希并核对链接
    pub async fn verify_chain(&self) -> AuditStorageResult<ChainVerification> {
        let sql = format!("{ENTRY_SELECT} ORDER BY id");
        let entries = sqlx::query_as::<_, AuditEntry>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut expected_prev = GENESIS_HASH.to_string();
        let mut checked = 0i64;

        for entry in &entries {
            let details_str = serde_json::to_string(&entry.details)?;
            let recomputed = entry_hash(
                &entry.prev_hash,
                entry.timestamp,
                entry.action,
                &entry.resource_type,
                &entry.resource_id,
                entry.operator_id,
                entry.operator_name.as_deref(),
                &details_str,
            )?;
            if entry.prev_hash != expected_prev || entry.curr_hash != recomputed {
                return Ok(ChainVerification {
                    valid: false,
                    entries_checked: checked,
                    broken_at: Some(entry.id),
                });
            }
            expected_prev = entry.curr_hash.clone();
            checked += 1;
        }

        Ok(ChainVerification {
            valid: true,
            entries_checked: checked,
            broken_at: None,
        })
    }
}
