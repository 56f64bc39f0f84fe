//! Order pricing calculator (pure)
//!
//! 逐行计算折扣与附加费：
//! - 互斥 (is_exclusive) 折扣命中时单独生效，取金额最大的一条
//! - 否则所有可叠加折扣 + 最优一条不可叠加折扣
//! - 附加费独立累加
//! - 折扣不把单行打到负数；金额一律 2 位小数入账

use chrono::DateTime;
use chrono_tz::Tz;

use shared::models::{
    AdjustmentType, AppliedRule, OrderChannel, PriceRule, Product, RuleType,
};

use crate::pricing::matcher;
use crate::utils::money;

/// One order line before pricing
#[derive(Debug, Clone, Copy)]
pub struct LineInput<'a> {
    pub product: &'a Product,
    pub qty: i64,
}

/// Priced line item, ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub product_id: i64,
    pub name: String,
    pub qty: i64,
    pub unit_price: f64,
    pub unit_weight_kg: f64,
    pub line_subtotal: f64,
    pub discount: f64,
    pub surcharge: f64,
    pub line_total: f64,
}

/// Priced order, ready for insertion
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PricedOrder {
    pub subtotal: f64,
    pub discount_total: f64,
    pub surcharge_total: f64,
    pub total: f64,
    pub applied_rules: Vec<AppliedRule>,
    pub items: Vec<PricedItem>,
}

/// Adjustment amount of one rule against one line
fn adjustment_amount(rule: &PriceRule, line_subtotal: f64, qty: i64) -> f64 {
    match rule.adjustment_type {
        AdjustmentType::Percentage => money::percentage(line_subtotal, rule.adjustment_value),
        AdjustmentType::FixedAmount => money::mul_qty(rule.adjustment_value, qty),
    }
}

/// Price all lines of an order against the active rule set
pub fn price_lines(
    lines: &[LineInput],
    rules: &[PriceRule],
    channel: OrderChannel,
    now: DateTime<Tz>,
) -> PricedOrder {
    let mut items = Vec::with_capacity(lines.len());
    let mut applied: Vec<AppliedRule> = Vec::new();

    for line in lines {
        let line_subtotal = money::mul_qty(line.product.price, line.qty);

        let matching: Vec<&PriceRule> = rules
            .iter()
            .filter(|r| r.is_active)
            .filter(|r| {
                matcher::matches_product_scope(r, line.product.id, line.product.category_id)
            })
            .filter(|r| matcher::matches_channel_scope(r, channel))
            .filter(|r| matcher::is_time_valid(r, now))
            .collect();

        let discounts: Vec<&PriceRule> = matching
            .iter()
            .copied()
            .filter(|r| r.rule_type == RuleType::Discount)
            .collect();
        let surcharges: Vec<&PriceRule> = matching
            .iter()
            .copied()
            .filter(|r| r.rule_type == RuleType::Surcharge)
            .collect();

        // ── Discounts ───────────────────────────────────────────────
        let mut line_discount = 0.0;
        let mut discount_applied: Vec<(&PriceRule, f64)> = Vec::new();

        let exclusive_best = discounts
            .iter()
            .filter(|r| r.is_exclusive)
            .map(|&r| (r, adjustment_amount(r, line_subtotal, line.qty)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((rule, amount)) = exclusive_best {
            line_discount = amount;
            discount_applied.push((rule, amount));
        } else {
            for &rule in discounts.iter().filter(|r| r.is_stackable) {
                let amount = adjustment_amount(rule, line_subtotal, line.qty);
                line_discount = money::add(line_discount, amount);
                discount_applied.push((rule, amount));
            }
            let best_non_stackable = discounts
                .iter()
                .filter(|r| !r.is_stackable && !r.is_exclusive)
                .map(|&r| (r, adjustment_amount(r, line_subtotal, line.qty)))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((rule, amount)) = best_non_stackable {
                line_discount = money::add(line_discount, amount);
                discount_applied.push((rule, amount));
            }
        }

        // 折扣封顶：单行不出负数
        if line_discount > line_subtotal {
            let scale = if line_discount > 0.0 {
                line_subtotal / line_discount
            } else {
                0.0
            };
            for entry in &mut discount_applied {
                entry.1 = money::round_cash(entry.1 * scale);
            }
            line_discount = line_subtotal;
        }

        // ── Surcharges ──────────────────────────────────────────────
        let mut line_surcharge = 0.0;
        let mut surcharge_applied: Vec<(&PriceRule, f64)> = Vec::new();
        for &rule in &surcharges {
            let amount = adjustment_amount(rule, line_subtotal, line.qty);
            line_surcharge = money::add(line_surcharge, amount);
            surcharge_applied.push((rule, amount));
        }

        let line_total = money::add(money::sub(line_subtotal, line_discount), line_surcharge);

        for (rule, amount) in discount_applied {
            merge_applied(&mut applied, rule, -amount);
        }
        for (rule, amount) in surcharge_applied {
            merge_applied(&mut applied, rule, amount);
        }

        items.push(PricedItem {
            product_id: line.product.id,
            name: line.product.name.clone(),
            qty: line.qty,
            unit_price: line.product.price,
            unit_weight_kg: line.product.unit_weight_kg,
            line_subtotal,
            discount: line_discount,
            surcharge: line_surcharge,
            line_total,
        });
    }

    let subtotal = money::sum(items.iter().map(|i| i.line_subtotal));
    let discount_total = money::sum(items.iter().map(|i| i.discount));
    let surcharge_total = money::sum(items.iter().map(|i| i.surcharge));
    let total = money::sum(items.iter().map(|i| i.line_total));

    PricedOrder {
        subtotal,
        discount_total,
        surcharge_total,
        total,
        applied_rules: applied,
        items,
    }
}

/// Aggregate per-rule amounts across lines
fn merge_applied(applied: &mut Vec<AppliedRule>, rule: &PriceRule, amount: f64) {
    if money::is_zero(amount) {
        return;
    }
    if let Some(existing) = applied.iter_mut().find(|a| a.rule_id == rule.id) {
        existing.amount = money::add(existing.amount, amount);
        return;
    }
    applied.push(AppliedRule {
        rule_id: rule.id,
        receipt_name: rule.receipt_name.clone(),
        rule_type: match rule.rule_type {
            RuleType::Discount => "DISCOUNT".to_string(),
            RuleType::Surcharge => "SURCHARGE".to_string(),
        },
        amount,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::{ChannelScope, ProductScope};

    const TZ: Tz = chrono_tz::Asia::Manila;

    fn product(id: i64, price: f64) -> Product {
        Product {
            id,
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            category_id: Some(7),
            price,
            unit_weight_kg: 1.0,
            track_stock: false,
            stock_qty: 0,
            component_product_id: None,
            component_qty: 1,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn rule(id: i64, rule_type: RuleType, value: f64) -> PriceRule {
        PriceRule {
            id,
            name: format!("rule-{id}"),
            display_name: format!("Rule {id}"),
            receipt_name: format!("R{id}"),
            description: None,
            rule_type,
            product_scope: ProductScope::Global,
            target_id: None,
            channel_scope: ChannelScope::All,
            adjustment_type: AdjustmentType::Percentage,
            adjustment_value: value,
            is_stackable: true,
            is_exclusive: false,
            valid_from: None,
            valid_until: None,
            active_days: Vec::new(),
            active_start_time: None,
            active_end_time: None,
            is_active: true,
            created_by: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn now() -> DateTime<Tz> {
        TZ.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_rules_totals_are_plain_sums() {
        let p = product(1, 19.99);
        let priced = price_lines(
            &[LineInput { product: &p, qty: 3 }],
            &[],
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(priced.subtotal, 59.97);
        assert_eq!(priced.total, 59.97);
        assert!(priced.applied_rules.is_empty());
    }

    #[test]
    fn stackable_discounts_accumulate() {
        let p = product(1, 100.0);
        let rules = vec![
            rule(1, RuleType::Discount, 10.0),
            rule(2, RuleType::Discount, 5.0),
        ];
        let priced = price_lines(
            &[LineInput { product: &p, qty: 1 }],
            &rules,
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(priced.discount_total, 15.0);
        assert_eq!(priced.total, 85.0);
        assert_eq!(priced.applied_rules.len(), 2);
    }

    #[test]
    fn exclusive_discount_wins_alone() {
        let p = product(1, 100.0);
        let mut exclusive = rule(1, RuleType::Discount, 20.0);
        exclusive.is_exclusive = true;
        let rules = vec![exclusive, rule(2, RuleType::Discount, 10.0)];
        let priced = price_lines(
            &[LineInput { product: &p, qty: 1 }],
            &rules,
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(priced.discount_total, 20.0);
        assert_eq!(priced.applied_rules.len(), 1);
        assert_eq!(priced.applied_rules[0].rule_id, 1);
    }

    #[test]
    fn best_non_stackable_discount_joins_stackables() {
        let p = product(1, 100.0);
        let mut big = rule(1, RuleType::Discount, 15.0);
        big.is_stackable = false;
        let mut small = rule(2, RuleType::Discount, 5.0);
        small.is_stackable = false;
        let rules = vec![big, small, rule(3, RuleType::Discount, 10.0)];
        let priced = price_lines(
            &[LineInput { product: &p, qty: 1 }],
            &rules,
            OrderChannel::Walkin,
            now(),
        );
        // 10% stackable + 15% best non-stackable, 5% dropped
        assert_eq!(priced.discount_total, 25.0);
        assert_eq!(priced.applied_rules.len(), 2);
    }

    #[test]
    fn surcharge_adds_on_top() {
        let p = product(1, 200.0);
        let mut delivery_fee = rule(1, RuleType::Surcharge, 5.0);
        delivery_fee.channel_scope = ChannelScope::Delivery;
        let rules = vec![delivery_fee];

        let walkin = price_lines(
            &[LineInput { product: &p, qty: 1 }],
            &rules,
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(walkin.surcharge_total, 0.0);

        let delivery = price_lines(
            &[LineInput { product: &p, qty: 1 }],
            &rules,
            OrderChannel::Delivery,
            now(),
        );
        assert_eq!(delivery.surcharge_total, 10.0);
        assert_eq!(delivery.total, 210.0);
    }

    #[test]
    fn discount_never_goes_below_zero() {
        let p = product(1, 10.0);
        let mut huge = rule(1, RuleType::Discount, 150.0);
        huge.adjustment_type = AdjustmentType::FixedAmount;
        let priced = price_lines(
            &[LineInput { product: &p, qty: 1 }],
            &[huge],
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(priced.discount_total, 10.0);
        assert_eq!(priced.total, 0.0);
    }

    #[test]
    fn fixed_amount_scales_with_qty() {
        let p = product(1, 50.0);
        let mut fixed = rule(1, RuleType::Discount, 5.0);
        fixed.adjustment_type = AdjustmentType::FixedAmount;
        let priced = price_lines(
            &[LineInput { product: &p, qty: 4 }],
            &[fixed],
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(priced.discount_total, 20.0);
        assert_eq!(priced.total, 180.0);
    }

    #[test]
    fn product_scoped_rule_skips_other_lines() {
        let a = product(1, 100.0);
        let b = product(2, 100.0);
        let mut scoped = rule(1, RuleType::Discount, 10.0);
        scoped.product_scope = ProductScope::Product;
        scoped.target_id = Some(1);
        let priced = price_lines(
            &[
                LineInput { product: &a, qty: 1 },
                LineInput { product: &b, qty: 1 },
            ],
            &[scoped],
            OrderChannel::Walkin,
            now(),
        );
        assert_eq!(priced.discount_total, 10.0);
        assert_eq!(priced.items[0].discount, 10.0);
        assert_eq!(priced.items[1].discount, 0.0);
    }
}
