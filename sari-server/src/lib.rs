//! Sari Server - 零售/配送 POS 与后台管理系统
//!
//! # 架构概述
//!
//! 本模块是 Sari Server 的主入口，提供以下核心功能：
//!
//! - **数据库** (`db`): 嵌入式 SQLite 存储 (sqlx + migrations)
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **定价** (`pricing`): 价格规则引擎
//! - **配送** (`dispatch`): 车辆装载量计算
//! - **审计** (`audit`): 防篡改审计日志
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! sari-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、权限
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (repository)
//! ├── pricing/       # 价格规则引擎
//! ├── dispatch/      # 配送装载量
//! ├── audit/         # 审计日志
//! ├── shifts.rs      # 班次过期检测
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod dispatch;
pub mod pricing;
pub mod shifts;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Audit logging macro - 非阻塞写入审计服务
#[macro_export]
macro_rules! audit_log {
    ($svc:expr, $action:expr, $rtype:expr, $rid:expr, operator_id = $oid:expr, operator_name = $oname:expr, details = $details:expr) => {
        $svc.log($action, $rtype, $rid, $oid, $oname, $details)
    };
}

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境 (dotenv, 工作目录, 日志)
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/sari".into());
    let log_dir = std::path::Path::new(&work_dir).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_level = std::env::var("LOG_LEVEL").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.to_str());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   _____ ___    ____  ____
  / ___//   |  / __ \/  _/
  \__ \/ /| | / /_/ // /
 ___/ / ___ |/ _, _// /
/____/_/  |_/_/ |_/___/
    "#
    );
}
