//! Dispatch lifecycle: load → capacity checks → dispatch → deliver →
//! return → remit

mod common;

use common::ProductSpec;
use sari_server::db::repository::{RepoError, delivery_run, order, remittance};
use sari_server::pricing::PriceRuleEngine;
use shared::models::{
    DeliveryRunCreate, Fulfillment, OrderChannel, OrderCreate, OrderItemInput, RemittanceCreate,
    RunDeliverOrder, RunExpenseCreate, RunStatus,
};

const TZ: chrono_tz::Tz = chrono_tz::Asia::Manila;

async fn delivery_order(
    pool: &sqlx::SqlitePool,
    product_id: i64,
    qty: i64,
    customer: &shared::models::Customer,
    created_by: i64,
) -> shared::models::Order {
    let data = OrderCreate {
        channel: OrderChannel::Delivery,
        customer_id: Some(customer.id),
        delivery_address: Some("456 Rizal Ave".to_string()),
        note: None,
        items: vec![OrderItemInput { product_id, qty }],
    };
    let priced = PriceRuleEngine::price_order(pool, &data.items, data.channel, TZ)
        .await
        .expect("price");
    order::create(pool, &data, &priced, Some(customer.name.clone()), created_by)
        .await
        .expect("create delivery order")
}

struct Fixture {
    pool: sqlx::SqlitePool,
    dispatcher: shared::models::EmployeeResponse,
    rider: shared::models::EmployeeResponse,
    vehicle: shared::models::Vehicle,
    customer: shared::models::Customer,
    product: shared::models::Product,
}

/// Vehicle carries 100 kg / 2 stops; product weighs 11 kg a unit
async fn fixture() -> Fixture {
    let pool = common::test_pool().await;
    let dispatcher = common::create_employee(&pool, "dora", "manager", false).await;
    let rider = common::create_employee(&pool, "ramon", "rider", true).await;
    let vehicle = common::create_vehicle(&pool, "TRK-001", 100.0, 2).await;
    let customer = common::create_customer(&pool, "Aling Nena", "+639171230001").await;
    let product = common::create_product(
        &pool,
        ProductSpec {
            sku: "LPG-REFILL",
            price: 950.0,
            unit_weight_kg: 11.0,
            ..Default::default()
        },
    )
    .await;
    Fixture {
        pool,
        dispatcher,
        rider,
        vehicle,
        customer,
        product,
    }
}

async fn open_run(f: &Fixture) -> shared::models::DeliveryRun {
    delivery_run::create(
        &f.pool,
        &DeliveryRunCreate {
            rider_id: f.rider.id,
            vehicle_id: f.vehicle.id,
            note: None,
        },
        &f.rider.display_name,
        &f.vehicle.name,
        f.dispatcher.id,
    )
    .await
    .expect("create run")
}

#[tokio::test]
async fn assign_rejects_overweight_loadout() {
    let f = fixture().await;
    let run = open_run(&f).await;

    // 8 × 11 kg = 88 kg fits
    let within = delivery_order(&f.pool, f.product.id, 8, &f.customer, f.dispatcher.id).await;
    let (assigned, loadout) = delivery_run::assign_order(&f.pool, run.id, within.id)
        .await
        .expect("first order fits");
    assert_eq!(assigned.fulfillment, Fulfillment::Assigned);
    assert_eq!(loadout.total_weight_kg, 88.0);

    // +2 × 11 kg = 110 kg exceeds the 100 kg limit
    let overweight = delivery_order(&f.pool, f.product.id, 2, &f.customer, f.dispatcher.id).await;
    let err = delivery_run::assign_order(&f.pool, run.id, overweight.id)
        .await
        .expect_err("capacity exceeded");
    assert!(matches!(err, RepoError::BusinessRule(_)));

    // The rejected order is untouched
    let rejected = order::find_by_id(&f.pool, overweight.id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(rejected.fulfillment, Fulfillment::Pending);
    assert!(rejected.delivery_run_id.is_none());
}

#[tokio::test]
async fn assign_rejects_too_many_stops() {
    let f = fixture().await;
    let run = open_run(&f).await;

    for _ in 0..2 {
        let o = delivery_order(&f.pool, f.product.id, 1, &f.customer, f.dispatcher.id).await;
        delivery_run::assign_order(&f.pool, run.id, o.id)
            .await
            .expect("stop fits");
    }

    let third = delivery_order(&f.pool, f.product.id, 1, &f.customer, f.dispatcher.id).await;
    let err = delivery_run::assign_order(&f.pool, run.id, third.id)
        .await
        .expect_err("stop limit");
    assert!(matches!(err, RepoError::BusinessRule(_)));
}

#[tokio::test]
async fn walkin_orders_cannot_be_dispatched() {
    let f = fixture().await;
    let run = open_run(&f).await;

    let data = OrderCreate {
        channel: OrderChannel::Walkin,
        customer_id: None,
        delivery_address: None,
        note: None,
        items: vec![OrderItemInput {
            product_id: f.product.id,
            qty: 1,
        }],
    };
    let priced = PriceRuleEngine::price_order(&f.pool, &data.items, data.channel, TZ)
        .await
        .expect("price");
    let walkin = order::create(&f.pool, &data, &priced, None, f.dispatcher.id)
        .await
        .expect("walkin order");

    let err = delivery_run::assign_order(&f.pool, run.id, walkin.id)
        .await
        .expect_err("walkin rejected");
    assert!(matches!(err, RepoError::BusinessRule(_)));
}

#[tokio::test]
async fn empty_run_cannot_dispatch() {
    let f = fixture().await;
    let run = open_run(&f).await;
    let err = delivery_run::dispatch_run(&f.pool, run.id)
        .await
        .expect_err("empty run");
    assert!(matches!(err, RepoError::BusinessRule(_)));
}

#[tokio::test]
async fn one_unsettled_run_per_rider() {
    let f = fixture().await;
    open_run(&f).await;

    let second_vehicle = common::create_vehicle(&f.pool, "TRK-002", 100.0, 5).await;
    let err = delivery_run::create(
        &f.pool,
        &DeliveryRunCreate {
            rider_id: f.rider.id,
            vehicle_id: second_vehicle.id,
            note: None,
        },
        &f.rider.display_name,
        &second_vehicle.name,
        f.dispatcher.id,
    )
    .await
    .expect_err("rider busy");
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn full_run_and_remittance_flow() {
    let f = fixture().await;
    let run = open_run(&f).await;

    let delivered = delivery_order(&f.pool, f.product.id, 1, &f.customer, f.dispatcher.id).await;
    let failed = delivery_order(&f.pool, f.product.id, 1, &f.customer, f.dispatcher.id).await;
    delivery_run::assign_order(&f.pool, run.id, delivered.id)
        .await
        .expect("assign 1");
    delivery_run::assign_order(&f.pool, run.id, failed.id)
        .await
        .expect("assign 2");

    let run_after = delivery_run::dispatch_run(&f.pool, run.id)
        .await
        .expect("dispatch");
    assert_eq!(run_after.status, RunStatus::Dispatched);
    assert!(run_after.dispatched_at.is_some());

    // Rider collects COD on the delivered stop
    delivery_run::deliver_order(
        &f.pool,
        run.id,
        delivered.id,
        &RunDeliverOrder {
            cod_amount: Some(950.0),
            note: None,
        },
    )
    .await
    .expect("deliver");

    // Fuel expense on the way
    delivery_run::add_expense(
        &f.pool,
        run.id,
        &RunExpenseCreate {
            label: "fuel".to_string(),
            amount: 150.0,
        },
        f.dispatcher.id,
    )
    .await
    .expect("expense");

    let run_after = delivery_run::return_run(&f.pool, run.id).await.expect("return");
    assert_eq!(run_after.status, RunStatus::Returned);

    // Undelivered order flagged RETURNED
    let failed_after = order::find_by_id(&f.pool, failed.id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(failed_after.fulfillment, Fulfillment::Returned);

    // Cash to remit = 950 COD − 150 expenses
    let preview = delivery_run::remit_preview(&f.pool, run.id)
        .await
        .expect("preview");
    assert_eq!(preview.cod_collected, 950.0);
    assert_eq!(preview.expense_total, 150.0);
    assert_eq!(preview.cash_to_remit, 800.0);
    assert_eq!(preview.delivered_orders, 1);
    assert_eq!(preview.returned_orders, 1);

    // Short remit beyond tolerance without a note is refused
    let err = remittance::create(
        &f.pool,
        &RemittanceCreate {
            run_id: run.id,
            remitted_amount: 700.0,
            note: None,
        },
        f.dispatcher.id,
        0.0,
    )
    .await
    .expect_err("short without note");
    assert!(matches!(err, RepoError::BusinessRule(_)));

    // With a note it goes through and settles the run atomically
    let remit = remittance::create(
        &f.pool,
        &RemittanceCreate {
            run_id: run.id,
            remitted_amount: 700.0,
            note: Some("100 short, rider to repay".to_string()),
        },
        f.dispatcher.id,
        0.0,
    )
    .await
    .expect("remit");
    assert_eq!(remit.expected_amount, 800.0);
    assert_eq!(remit.variance, -100.0);

    let settled = delivery_run::find_by_id(&f.pool, run.id)
        .await
        .expect("query")
        .expect("run");
    assert_eq!(settled.status, RunStatus::Settled);

    // Second remittance for the same run is refused
    let err = remittance::create(
        &f.pool,
        &RemittanceCreate {
            run_id: run.id,
            remitted_amount: 800.0,
            note: None,
        },
        f.dispatcher.id,
        0.0,
    )
    .await
    .expect_err("double remit");
    assert!(matches!(err, RepoError::Duplicate(_)));

    // Delivered order can now be completed (COD covered the balance)
    let (completed, case) = order::complete(&f.pool, delivered.id).await.expect("complete");
    assert_eq!(completed.status, shared::models::OrderStatus::Completed);
    assert!(case.is_none());
}

#[tokio::test]
async fn deliver_requires_dispatched_run() {
    let f = fixture().await;
    let run = open_run(&f).await;
    let o = delivery_order(&f.pool, f.product.id, 1, &f.customer, f.dispatcher.id).await;
    delivery_run::assign_order(&f.pool, run.id, o.id)
        .await
        .expect("assign");

    let err = delivery_run::deliver_order(
        &f.pool,
        run.id,
        o.id,
        &RunDeliverOrder::default(),
    )
    .await
    .expect_err("not dispatched yet");
    assert!(matches!(err, RepoError::BusinessRule(_)));
}
