//! Price Rule Matcher
//!
//! Logic for matching rules to products/channels and checking time validity.

use chrono::{DateTime, Datelike, NaiveTime, Weekday};
use chrono_tz::Tz;

use shared::models::{ChannelScope, OrderChannel, PriceRule, ProductScope};

/// Check if a rule matches a product based on scope
pub fn matches_product_scope(
    rule: &PriceRule,
    product_id: i64,
    category_id: Option<i64>,
) -> bool {
    match rule.product_scope {
        ProductScope::Global => true,
        ProductScope::Product => rule.target_id == Some(product_id),
        ProductScope::Category => match (rule.target_id, category_id) {
            (Some(target), Some(cat)) => target == cat,
            _ => false,
        },
    }
}

/// Check if a rule matches the order's sales channel
pub fn matches_channel_scope(rule: &PriceRule, channel: OrderChannel) -> bool {
    match rule.channel_scope {
        ChannelScope::All => true,
        ChannelScope::Walkin => channel == OrderChannel::Walkin,
        ChannelScope::Delivery => channel == OrderChannel::Delivery,
    }
}

/// Check if a rule is currently active based on its time constraints
///
/// - validity window (`valid_from` / `valid_until`, Unix millis)
/// - active days of week (empty = every day; 0=Sunday..6=Saturday)
/// - daily time window, overnight ranges supported (22:00–02:00)
pub fn is_time_valid(rule: &PriceRule, now: DateTime<Tz>) -> bool {
    let now_millis = now.timestamp_millis();
    if let Some(from) = rule.valid_from
        && now_millis < from
    {
        return false;
    }
    if let Some(until) = rule.valid_until
        && now_millis > until
    {
        return false;
    }

    if !rule.active_days.is_empty() {
        let current_day = match now.weekday() {
            Weekday::Sun => 0,
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
        };
        if !rule.active_days.contains(&current_day) {
            return false;
        }
    }

    if let (Some(start), Some(end)) = (&rule.active_start_time, &rule.active_end_time)
        && let (Ok(start_time), Ok(end_time)) = (
            NaiveTime::parse_from_str(start, "%H:%M"),
            NaiveTime::parse_from_str(end, "%H:%M"),
        )
    {
        let current_time = now.time();

        // Handle overnight ranges (e.g., 22:00 - 02:00)
        if start_time <= end_time {
            if !(current_time >= start_time && current_time <= end_time) {
                return false;
            }
        } else {
            // Overnight
            if !(current_time >= start_time || current_time <= end_time) {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::{AdjustmentType, RuleType};

    const TZ: Tz = chrono_tz::Asia::Manila;

    fn make_rule(product_scope: ProductScope, target_id: Option<i64>) -> PriceRule {
        PriceRule {
            id: 1,
            name: "test".to_string(),
            display_name: "Test".to_string(),
            receipt_name: "TEST".to_string(),
            description: None,
            rule_type: RuleType::Discount,
            product_scope,
            target_id,
            channel_scope: ChannelScope::All,
            adjustment_type: AdjustmentType::Percentage,
            adjustment_value: 10.0,
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

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        TZ.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn global_scope_matches_all() {
        let rule = make_rule(ProductScope::Global, None);
        assert!(matches_product_scope(&rule, 123, Some(7)));
        assert!(matches_product_scope(&rule, 456, None));
    }

    #[test]
    fn product_scope_matches_specific() {
        let rule = make_rule(ProductScope::Product, Some(123));
        assert!(matches_product_scope(&rule, 123, Some(7)));
        assert!(!matches_product_scope(&rule, 456, Some(7)));
    }

    #[test]
    fn category_scope_needs_matching_category() {
        let rule = make_rule(ProductScope::Category, Some(7));
        assert!(matches_product_scope(&rule, 123, Some(7)));
        assert!(!matches_product_scope(&rule, 123, Some(8)));
        assert!(!matches_product_scope(&rule, 123, None));
    }

    #[test]
    fn channel_scope_filtering() {
        let mut rule = make_rule(ProductScope::Global, None);
        rule.channel_scope = ChannelScope::Delivery;
        assert!(matches_channel_scope(&rule, OrderChannel::Delivery));
        assert!(!matches_channel_scope(&rule, OrderChannel::Walkin));

        rule.channel_scope = ChannelScope::All;
        assert!(matches_channel_scope(&rule, OrderChannel::Walkin));
    }

    #[test]
    fn validity_window_bounds() {
        let mut rule = make_rule(ProductScope::Global, None);
        let start = at(2026, 3, 1, 0, 0);
        let end = at(2026, 3, 31, 23, 59);
        rule.valid_from = Some(start.timestamp_millis());
        rule.valid_until = Some(end.timestamp_millis());

        assert!(is_time_valid(&rule, at(2026, 3, 15, 12, 0)));
        assert!(!is_time_valid(&rule, at(2026, 2, 28, 12, 0)));
        assert!(!is_time_valid(&rule, at(2026, 4, 1, 0, 0)));
    }

    #[test]
    fn active_days_restrict() {
        let mut rule = make_rule(ProductScope::Global, None);
        // Monday only
        rule.active_days = vec![1];
        // 2026-03-16 is a Monday
        assert!(is_time_valid(&rule, at(2026, 3, 16, 12, 0)));
        // 2026-03-17 is a Tuesday
        assert!(!is_time_valid(&rule, at(2026, 3, 17, 12, 0)));
    }

    #[test]
    fn daytime_window() {
        let mut rule = make_rule(ProductScope::Global, None);
        rule.active_start_time = Some("14:00".to_string());
        rule.active_end_time = Some("17:00".to_string());
        assert!(is_time_valid(&rule, at(2026, 3, 16, 15, 0)));
        assert!(!is_time_valid(&rule, at(2026, 3, 16, 12, 0)));
    }

    #[test]
    fn overnight_window_wraps_midnight() {
        let mut rule = make_rule(ProductScope::Global, None);
        rule.active_start_time = Some("22:00".to_string());
        rule.active_end_time = Some("02:00".to_string());
        assert!(is_time_valid(&rule, at(2026, 3, 16, 23, 0)));
        assert!(is_time_valid(&rule, at(2026, 3, 16, 1, 0)));
        assert!(!is_time_valid(&rule, at(2026, 3, 16, 12, 0)));
    }
}
