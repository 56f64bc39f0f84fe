//! Price Rule Model

use serde::{Deserialize, Serialize};

/// Rule type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RuleType {
    Discount,
    Surcharge,
}

/// Product scope enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProductScope {
    Global,
    Category,
    Product,
}

/// Channel scope enum (which sales channel the rule applies to)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ChannelScope {
    All,
    Walkin,
    Delivery,
}

/// Adjustment type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AdjustmentType {
    Percentage,
    FixedAmount,
}

/// Price rule entity (价格调整规则)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PriceRule {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub receipt_name: String,
    pub description: Option<String>,
    pub rule_type: RuleType,
    pub product_scope: ProductScope,
    /// Target record ID based on scope (category/product ID)
    pub target_id: Option<i64>,
    pub channel_scope: ChannelScope,
    pub adjustment_type: AdjustmentType,
    /// Adjustment value (percentage: 30=30%, fixed: 5.00=₱5 per unit)
    pub adjustment_value: f64,
    pub is_stackable: bool,
    pub is_exclusive: bool,
    /// Valid from datetime (Unix millis)
    pub valid_from: Option<i64>,
    /// Valid until datetime (Unix millis)
    pub valid_until: Option<i64>,
    /// Active days of week (JSON array: 0=Sunday..6=Saturday; empty = all)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub active_days: Vec<u8>,
    /// Active start time (HH:MM format)
    pub active_start_time: Option<String>,
    /// Active end time (HH:MM format; overnight ranges supported)
    pub active_end_time: Option<String>,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create price rule payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRuleCreate {
    pub name: String,
    pub display_name: String,
    pub receipt_name: String,
    pub description: Option<String>,
    pub rule_type: RuleType,
    pub product_scope: ProductScope,
    pub target_id: Option<i64>,
    pub channel_scope: Option<ChannelScope>,
    pub adjustment_type: AdjustmentType,
    pub adjustment_value: f64,
    pub is_stackable: Option<bool>,
    pub is_exclusive: Option<bool>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    #[serde(default)]
    pub active_days: Vec<u8>,
    pub active_start_time: Option<String>,
    pub active_end_time: Option<String>,
    pub created_by: Option<i64>,
}

/// Update price rule payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceRuleUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub receipt_name: Option<String>,
    pub description: Option<String>,
    pub rule_type: Option<RuleType>,
    pub product_scope: Option<ProductScope>,
    pub target_id: Option<i64>,
    pub channel_scope: Option<ChannelScope>,
    pub adjustment_type: Option<AdjustmentType>,
    pub adjustment_value: Option<f64>,
    pub is_stackable: Option<bool>,
    pub is_exclusive: Option<bool>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub active_days: Option<Vec<u8>>,
    pub active_start_time: Option<String>,
    pub active_end_time: Option<String>,
    pub is_active: Option<bool>,
}
