//! 审计日志模块
//!
//! Append-only 审计日志，SHA256 哈希链防篡改：
//! - [`types`] - 操作类型与条目结构
//! - [`storage`] - SQLite 存储层 (哈希链)
//! - [`service`] - 后台写入服务 (mpsc worker)
//! - [`diff`] - 新旧对象差异

pub mod diff;
pub mod service;
pub mod storage;
pub mod types;

pub use diff::create_diff;
pub use service::AuditService;
pub use storage::{AuditStorage, AuditStorageError};
pub use types::{AuditAction, AuditEntry, AuditQuery};
