//! 价格规则引擎
//!
//! - [`matcher`] - 规则匹配 (作用域/渠道/时间窗)
//! - [`calculator`] - 逐行折扣/附加费计算 (纯函数)
//! - [`engine`] - 编排：加载激活规则并为订单定价

pub mod calculator;
pub mod engine;
pub mod matcher;

pub use calculator::{LineInput, PricedItem, PricedOrder};
pub use engine::PriceRuleEngine;
