use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::{Notify, broadcast};
use tokio_util::sync::CancellationToken;

use shared::models::SyncPayload;

use crate::audit::AuditService;
use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::shifts::ShiftAutoCloseScheduler;

/// 同步广播通道容量
const SYNC_CHANNEL_CAPACITY: usize = 256;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
///
/// # 使用场景
///
/// 用于 broadcast_sync 时自动生成递增的版本号，
/// 确保客户端可以通过版本号判断数据新旧。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    /// 创建空的版本管理器
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    ///
    /// 如果资源不存在，返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }

    /// 所有资源的当前版本快照
    pub fn snapshot(&self) -> std::collections::HashMap<String, u64> {
        self.versions
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是服务器的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | audit | 审计日志服务 |
/// | resource_versions | 资源版本管理 |
/// | sync_tx | 客户端同步广播通道 |
/// | config_notify | 门店配置变更信号 (营业日 cutoff 等) |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub audit: Arc<AuditService>,
    pub resource_versions: Arc<ResourceVersions>,
    pub sync_tx: broadcast::Sender<SyncPayload>,
    pub config_notify: Arc<Notify>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/sari.db, 迁移 + 默认数据)
    /// 3. 各服务 (JWT, Audit, Sync)
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        // 0. Ensure work_dir structure exists
        config.ensure_work_dir_structure()?;

        // 1. Initialize DB
        let db_path = config.database_dir().join("sari.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;
        let pool = db_service.pool;

        // 2. Seed default roles / admin / store info on first boot
        crate::db::seed::ensure_defaults(&pool).await?;

        // 3. Initialize services
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let audit = Arc::new(AuditService::start(pool.clone()));
        let resource_versions = Arc::new(ResourceVersions::new());
        let (sync_tx, _) = broadcast::channel(SYNC_CHANNEL_CAPACITY);

        Ok(Self {
            config: config.clone(),
            pool,
            jwt_service,
            audit,
            resource_versions,
            sync_tx,
            config_notify: Arc::new(Notify::new()),
        })
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 班次过期检测调度器 (ShiftAutoCloseScheduler)
    pub async fn start_background_tasks(&self, shutdown: CancellationToken) {
        let scheduler = ShiftAutoCloseScheduler::new(self.clone(), shutdown);
        tokio::spawn(scheduler.run());
    }

    /// 获取数据库连接池
    pub fn get_db(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 订阅同步广播
    pub fn subscribe_sync(&self) -> broadcast::Receiver<SyncPayload> {
        self.sync_tx.subscribe()
    }

    /// 广播同步消息
    ///
    /// 向所有连接的客户端广播资源变更通知。
    /// 版本号由 ResourceVersions 自动递增管理。
    ///
    /// # 参数
    /// - `resource`: 资源类型 (如 "order", "shift", "delivery_run")
    /// - `action`: 变更类型 ("created", "updated", "deleted", 领域动作)
    /// - `id`: 资源 ID
    /// - `data`: 资源数据 (deleted 时为 None)
    pub async fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        // 没有在线客户端时 send 返回 Err，属正常情况
        let _ = self.sync_tx.send(payload);
    }
}
