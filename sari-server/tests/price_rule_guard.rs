//! Price rule persistence: exclusive overlap prevention, soft delete,
//! engine integration

mod common;

use common::ProductSpec;
use sari_server::db::repository::{RepoError, price_rule};
use sari_server::pricing::PriceRuleEngine;
use shared::models::{
    AdjustmentType, ChannelScope, OrderChannel, OrderItemInput, PriceRuleCreate, PriceRuleUpdate,
    ProductScope, RuleType,
};

const TZ: chrono_tz::Tz = chrono_tz::Asia::Manila;

fn exclusive_rule(
    name: &str,
    valid_from: Option<i64>,
    valid_until: Option<i64>,
) -> PriceRuleCreate {
    PriceRuleCreate {
        name: name.to_string(),
        display_name: name.to_string(),
        receipt_name: name.to_uppercase(),
        description: None,
        rule_type: RuleType::Discount,
        product_scope: ProductScope::Global,
        target_id: None,
        channel_scope: Some(ChannelScope::All),
        adjustment_type: AdjustmentType::Percentage,
        adjustment_value: 10.0,
        is_stackable: Some(false),
        is_exclusive: Some(true),
        valid_from,
        valid_until,
        active_days: Vec::new(),
        active_start_time: None,
        active_end_time: None,
        created_by: None,
    }
}

#[tokio::test]
async fn overlapping_exclusive_rules_are_rejected() {
    let pool = common::test_pool().await;

    price_rule::create(&pool, exclusive_rule("march-promo", Some(1000), Some(2000)))
        .await
        .expect("first rule");

    // Overlapping window, same scope/channel
    let err = price_rule::create(&pool, exclusive_rule("rival-promo", Some(1500), Some(3000)))
        .await
        .expect_err("overlap");
    assert!(matches!(err, RepoError::Duplicate(_)));

    // Disjoint window is fine
    price_rule::create(&pool, exclusive_rule("april-promo", Some(2001), Some(3000)))
        .await
        .expect("disjoint rule");

    // Unbounded window overlaps everything
    let err = price_rule::create(&pool, exclusive_rule("forever-promo", None, None))
        .await
        .expect_err("unbounded overlap");
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn deactivated_rule_frees_the_window() {
    let pool = common::test_pool().await;

    let first = price_rule::create(&pool, exclusive_rule("promo", Some(1000), Some(2000)))
        .await
        .expect("first rule");
    price_rule::delete(&pool, first.id).await.expect("soft delete");

    // Window is free again
    price_rule::create(&pool, exclusive_rule("replacement", Some(1000), Some(2000)))
        .await
        .expect("replacement rule");

    // Reactivating the first now collides
    let err = price_rule::update(
        &pool,
        first.id,
        PriceRuleUpdate {
            is_active: Some(true),
            ..Default::default()
        },
    )
    .await
    .expect_err("reactivation collides");
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn different_channel_scopes_do_not_collide() {
    let pool = common::test_pool().await;

    let mut walkin = exclusive_rule("walkin-promo", None, None);
    walkin.channel_scope = Some(ChannelScope::Walkin);
    price_rule::create(&pool, walkin).await.expect("walkin rule");

    let mut delivery = exclusive_rule("delivery-promo", None, None);
    delivery.channel_scope = Some(ChannelScope::Delivery);
    price_rule::create(&pool, delivery).await.expect("delivery rule");
}

#[tokio::test]
async fn engine_applies_persisted_rules() {
    let pool = common::test_pool().await;
    let product = common::create_product(
        &pool,
        ProductSpec {
            sku: "SODA",
            price: 100.0,
            ..Default::default()
        },
    )
    .await;

    let mut senior = exclusive_rule("senior-discount", None, None);
    senior.adjustment_value = 20.0;
    price_rule::create(&pool, senior).await.expect("rule");

    let priced = PriceRuleEngine::price_order(
        &pool,
        &[OrderItemInput {
            product_id: product.id,
            qty: 2,
        }],
        OrderChannel::Walkin,
        TZ,
    )
    .await
    .expect("price");

    assert_eq!(priced.subtotal, 200.0);
    assert_eq!(priced.discount_total, 40.0);
    assert_eq!(priced.total, 160.0);
    assert_eq!(priced.applied_rules.len(), 1);
    assert_eq!(priced.applied_rules[0].receipt_name, "SENIOR-DISCOUNT");
}
