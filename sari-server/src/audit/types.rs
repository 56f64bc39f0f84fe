//! 审计日志类型定义
//!
//! 税务级审计日志的核心数据结构。
//! 所有条目不可变、不可删除，支持 SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
///
/// 按领域分组，确保每个敏感操作都有明确的类型标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 认证 ═══
    /// 登录成功
    LoginSuccess,
    /// 登录失败
    LoginFailed,

    // ═══ 订单（财务关键）═══
    /// 订单创建
    OrderCreated,
    /// 订单完成
    OrderCompleted,
    /// 订单作废
    OrderVoided,
    /// 添加支付
    OrderPaymentAdded,

    // ═══ 班次 ═══
    /// 班次开启
    ShiftOpened,
    /// 班次更新
    ShiftUpdated,
    /// 班次关闭
    ShiftClosed,

    // ═══ 配送 ═══
    /// 批次发车
    RunDispatched,
    /// 批次回站
    RunReturned,
    /// 骑手交款
    RemittanceRecorded,

    // ═══ 挂账 ═══
    /// 挂账收款
    ClearanceSettled,
    /// 挂账核销
    ClearanceWrittenOff,

    // ═══ 管理操作 ═══
    /// 员工创建
    EmployeeCreated,
    /// 员工更新
    EmployeeUpdated,
    /// 角色变更
    RoleChanged,
    /// 商品库存调整
    StockAdjusted,
    /// 价格规则变更
    PriceRuleChanged,
    /// 门店信息变更
    StoreInfoChanged,
}

/// 审计日志条目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    /// 序号 (AUTOINCREMENT，严格递增)
    pub id: i64,
    pub timestamp: i64,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    /// 操作详情 (JSON)
    #[sqlx(json)]
    pub details: serde_json::Value,
    /// 前一条目的哈希 (首条为创世哈希)
    pub prev_hash: String,
    /// 本条目哈希
    pub curr_hash: String,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub action: Option<AuditAction>,
    pub resource_type: Option<String>,
    pub start_millis: Option<i64>,
    pub end_millis: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 哈希链校验结果
#[derive(Debug, Clone, Serialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub entries_checked: i64,
    /// 首个断链条目序号
    pub broken_at: Option<i64>,
}
