//! Order lifecycle: pricing → payments → completion (stock inference,
//! clearance cases)

mod common;

use common::ProductSpec;
use sari_server::db::repository::{RepoError, clearance, order, payment, product, shift};
use sari_server::pricing::PriceRuleEngine;
use shared::models::{
    ClearanceSettle, ClearanceStatus, OrderChannel, OrderCreate, OrderItemInput, OrderStatus,
    PaymentCreate, PaymentMethod, ShiftCreate,
};

const TZ: chrono_tz::Tz = chrono_tz::Asia::Manila;

async fn priced_order(
    pool: &sqlx::SqlitePool,
    data: &OrderCreate,
    created_by: i64,
    customer_name: Option<String>,
) -> shared::models::Order {
    let priced = PriceRuleEngine::price_order(pool, &data.items, data.channel, TZ)
        .await
        .expect("price order");
    order::create(pool, data, &priced, customer_name, created_by)
        .await
        .expect("create order")
}

fn walkin(items: Vec<OrderItemInput>, customer_id: Option<i64>) -> OrderCreate {
    OrderCreate {
        channel: OrderChannel::Walkin,
        customer_id,
        delivery_address: None,
        note: None,
        items,
    }
}

#[tokio::test]
async fn order_totals_come_from_pricing() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let p = common::create_product(
        &pool,
        ProductSpec {
            sku: "SODA",
            price: 25.5,
            ..Default::default()
        },
    )
    .await;

    let o = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 3,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;

    assert_eq!(o.status, OrderStatus::Open);
    assert_eq!(o.subtotal, 76.5);
    assert_eq!(o.total, 76.5);

    let items = order::items(&pool, o.id).await.expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].qty, 3);
    assert_eq!(items[0].line_total, 76.5);
}

#[tokio::test]
async fn cash_payment_requires_open_shift_and_fills_drawer() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let p = common::create_product(
        &pool,
        ProductSpec {
            sku: "RICE",
            price: 60.0,
            ..Default::default()
        },
    )
    .await;
    let o = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 1,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;

    // No open shift yet
    let err = payment::add_payment(
        &pool,
        o.id,
        &PaymentCreate {
            method: PaymentMethod::Cash,
            amount: 60.0,
            tendered: Some(100.0),
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect_err("cash without shift");
    assert!(matches!(err, RepoError::BusinessRule(_)));

    let s = shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 500.0,
            note: None,
        },
    )
    .await
    .expect("open shift");

    let pay = payment::add_payment(
        &pool,
        o.id,
        &PaymentCreate {
            method: PaymentMethod::Cash,
            amount: 60.0,
            tendered: Some(100.0),
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect("cash payment");

    assert_eq!(pay.shift_id, Some(s.id));
    assert_eq!(pay.change_amount, Some(40.0));

    let drawer = shift::find_by_id(&pool, s.id)
        .await
        .expect("shift query")
        .expect("shift");
    assert_eq!(drawer.expected_cash, 560.0);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let p = common::create_product(
        &pool,
        ProductSpec {
            sku: "EGGS",
            price: 10.0,
            ..Default::default()
        },
    )
    .await;
    let o = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 1,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;

    let err = payment::add_payment(
        &pool,
        o.id,
        &PaymentCreate {
            method: PaymentMethod::Card,
            amount: 20.0,
            tendered: None,
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect_err("overpay");
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn completion_deducts_component_stock() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;

    // Filled cylinders are the stocked unit; the refill SKU deducts them
    let filled = common::create_product(
        &pool,
        ProductSpec {
            sku: "LPG-FULL",
            price: 0.0,
            track_stock: true,
            stock_qty: 10,
            ..Default::default()
        },
    )
    .await;
    let refill = common::create_product(
        &pool,
        ProductSpec {
            sku: "LPG-REFILL",
            price: 950.0,
            component_product_id: Some(filled.id),
            component_qty: 1,
            ..Default::default()
        },
    )
    .await;

    let o = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: refill.id,
                qty: 3,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;

    payment::add_payment(
        &pool,
        o.id,
        &PaymentCreate {
            method: PaymentMethod::Card,
            amount: 2850.0,
            tendered: None,
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect("pay in full");

    let (completed, case) = order::complete(&pool, o.id).await.expect("complete");
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(case.is_none());

    let filled_after = product::find_by_id(&pool, filled.id)
        .await
        .expect("query")
        .expect("product");
    assert_eq!(filled_after.stock_qty, 7);
}

#[tokio::test]
async fn completion_rejects_insufficient_stock() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let p = common::create_product(
        &pool,
        ProductSpec {
            sku: "WATER",
            price: 35.0,
            track_stock: true,
            stock_qty: 2,
            ..Default::default()
        },
    )
    .await;

    let o = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 3,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;
    payment::add_payment(
        &pool,
        o.id,
        &PaymentCreate {
            method: PaymentMethod::Card,
            amount: 105.0,
            tendered: None,
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect("pay");

    let err = order::complete(&pool, o.id).await.expect_err("no stock");
    assert!(matches!(err, RepoError::BusinessRule(_)));

    // Transaction rolled back: stock untouched, order still open
    let p_after = product::find_by_id(&pool, p.id)
        .await
        .expect("query")
        .expect("product");
    assert_eq!(p_after.stock_qty, 2);
    let o_after = order::find_by_id(&pool, o.id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(o_after.status, OrderStatus::Open);
}

#[tokio::test]
async fn unpaid_balance_opens_clearance_case() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let customer = common::create_customer(&pool, "Aling Nena", "+639171230001").await;
    let p = common::create_product(
        &pool,
        ProductSpec {
            sku: "SACK",
            price: 2000.0,
            ..Default::default()
        },
    )
    .await;

    // No customer → completion with balance is refused
    let anonymous = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 1,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;
    let err = order::complete(&pool, anonymous.id)
        .await
        .expect_err("balance without customer");
    assert!(matches!(err, RepoError::BusinessRule(_)));

    // With a customer the balance becomes a clearance case
    let on_account = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 1,
            }],
            Some(customer.id),
        ),
        cashier.id,
        Some(customer.name.clone()),
    )
    .await;

    shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 0.0,
            note: None,
        },
    )
    .await
    .expect("shift");
    payment::add_payment(
        &pool,
        on_account.id,
        &PaymentCreate {
            method: PaymentMethod::Cash,
            amount: 500.0,
            tendered: Some(500.0),
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect("partial payment");

    let (_, case) = order::complete(&pool, on_account.id).await.expect("complete");
    let case = case.expect("clearance case opened");
    assert_eq!(case.status, ClearanceStatus::Open);
    assert_eq!(case.amount_outstanding, 1500.0);
    assert_eq!(case.customer_id, customer.id);

    // Collect in two installments; second one closes the case
    let (case, _) = clearance::settle(
        &pool,
        case.id,
        &ClearanceSettle {
            amount: 1000.0,
            method: PaymentMethod::Cash,
            note: None,
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect("first installment");
    assert_eq!(case.status, ClearanceStatus::Open);
    assert_eq!(case.amount_outstanding, 500.0);

    let (case, _) = clearance::settle(
        &pool,
        case.id,
        &ClearanceSettle {
            amount: 500.0,
            method: PaymentMethod::Cash,
            note: Some("final".to_string()),
        },
        cashier.id,
        &cashier.display_name,
    )
    .await
    .expect("final installment");
    assert_eq!(case.status, ClearanceStatus::Settled);
    assert_eq!(case.amount_outstanding, 0.0);

    // Case payments landed on the order
    let detail = order::find_detail(&pool, on_account.id)
        .await
        .expect("detail")
        .expect("order");
    assert_eq!(detail.balance_due, 0.0);
    assert_eq!(detail.payments.len(), 3);
}

#[tokio::test]
async fn void_requires_open_order() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let p = common::create_product(
        &pool,
        ProductSpec {
            sku: "GIN",
            price: 90.0,
            ..Default::default()
        },
    )
    .await;
    let o = priced_order(
        &pool,
        &walkin(
            vec![OrderItemInput {
                product_id: p.id,
                qty: 1,
            }],
            None,
        ),
        cashier.id,
        None,
    )
    .await;

    let voided = order::void(&pool, o.id, "wrong item").await.expect("void");
    assert_eq!(voided.status, OrderStatus::Voided);
    assert_eq!(voided.void_reason.as_deref(), Some("wrong item"));

    let err = order::void(&pool, o.id, "again").await.expect_err("double void");
    assert!(matches!(err, RepoError::BusinessRule(_)));
}
