//! Price Rule Engine
//!
//! 编排层：校验商品、加载激活规则、调用纯计算器为订单定价。

use chrono_tz::Tz;
use sqlx::SqlitePool;

use shared::models::{OrderChannel, OrderItemInput, Product};

use crate::db::repository::{price_rule, product};
use crate::pricing::calculator::{self, LineInput, PricedOrder};
use crate::utils::{AppError, AppResult};

/// Maximum quantity per line
const MAX_QUANTITY: i64 = 9999;
/// Maximum line count per order
const MAX_LINES: usize = 200;

pub struct PriceRuleEngine;

impl PriceRuleEngine {
    /// Validate the requested lines and price them against active rules.
    ///
    /// Returns the priced order ready for `order::create`.
    pub async fn price_order(
        pool: &SqlitePool,
        items: &[OrderItemInput],
        channel: OrderChannel,
        tz: Tz,
    ) -> AppResult<PricedOrder> {
        if items.is_empty() {
            return Err(AppError::validation("Order must have at least one item"));
        }
        if items.len() > MAX_LINES {
            return Err(AppError::validation(format!(
                "Order has too many lines (max {MAX_LINES})"
            )));
        }
        for item in items {
            if item.qty <= 0 || item.qty > MAX_QUANTITY {
                return Err(AppError::validation(format!(
                    "Invalid quantity {} for product {}",
                    item.qty, item.product_id
                )));
            }
        }

        let ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        let products = product::find_by_ids(pool, &ids).await?;

        let mut lines: Vec<LineInput> = Vec::with_capacity(items.len());
        for item in items {
            let product: &Product = products
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or_else(|| {
                    AppError::validation(format!("Product {} not found", item.product_id))
                })?;
            if !product.is_active {
                return Err(AppError::validation(format!(
                    "Product '{}' is inactive",
                    product.name
                )));
            }
            lines.push(LineInput {
                product,
                qty: item.qty,
            });
        }

        let rules = price_rule::find_active(pool).await?;
        let now = chrono::Utc::now().with_timezone(&tz);

        Ok(calculator::price_lines(&lines, &rules, channel, now))
    }
}
