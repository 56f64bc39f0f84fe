//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// # 库存扣减推断 (stock deduction inference)
///
/// 当商品声明了 `component_product_id` 时，完成订单不扣减商品自身库存，
/// 而是按 `qty × component_qty` 扣减组件商品的库存。
/// 典型场景：瓦斯换装 SKU 扣减满瓶库存，满瓶才是真正的库存单位。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub price: f64,
    /// Unit weight in kg, drives the dispatch loadout calculation
    pub unit_weight_kg: f64,
    /// Whether stock is tracked for this product (or its component)
    pub track_stock: bool,
    pub stock_qty: i64,
    /// When set, completing an order deducts the component's stock instead
    pub component_product_id: Option<i64>,
    /// Component units deducted per unit sold (default 1)
    pub component_qty: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub sku: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub price: f64,
    #[serde(default)]
    pub unit_weight_kg: f64,
    #[serde(default)]
    pub track_stock: bool,
    #[serde(default)]
    pub stock_qty: i64,
    pub component_product_id: Option<i64>,
    #[serde(default = "default_component_qty")]
    pub component_qty: i64,
}

fn default_component_qty() -> i64 {
    1
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub price: Option<f64>,
    pub unit_weight_kg: Option<f64>,
    pub track_stock: Option<bool>,
    pub component_product_id: Option<i64>,
    pub component_qty: Option<i64>,
    pub is_active: Option<bool>,
}

/// Manual stock adjustment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjust {
    /// Signed delta applied to `stock_qty`
    pub delta: i64,
    pub reason: String,
}
