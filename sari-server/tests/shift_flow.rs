//! Cashier shift lifecycle: open → cash payments → count → close

mod common;

use sari_server::db::repository::{RepoError, shift};
use shared::models::{ShiftClose, ShiftCreate, ShiftForceClose, ShiftStatus, ShiftUpdate};

#[tokio::test]
async fn open_shift_tracks_starting_cash() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;

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

    assert_eq!(s.status, ShiftStatus::Open);
    assert_eq!(s.starting_cash, 500.0);
    assert_eq!(s.expected_cash, 500.0);
    assert!(s.end_time.is_none());
}

#[tokio::test]
async fn second_open_shift_per_operator_is_rejected() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;

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
    .expect("first shift");

    let err = shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 0.0,
            note: None,
        },
    )
    .await
    .expect_err("second open shift must fail");
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn different_operators_can_open_in_parallel() {
    let pool = common::test_pool().await;
    let a = common::create_employee(&pool, "maria", "cashier", false).await;
    let b = common::create_employee(&pool, "jose", "cashier", false).await;

    shift::create(
        &pool,
        a.id,
        &a.display_name,
        ShiftCreate {
            starting_cash: 100.0,
            note: None,
        },
    )
    .await
    .expect("shift a");
    shift::create(
        &pool,
        b.id,
        &b.display_name,
        ShiftCreate {
            starting_cash: 200.0,
            note: None,
        },
    )
    .await
    .expect("shift b");

    let open = shift::find_all_open(&pool).await.expect("open shifts");
    assert_eq!(open.len(), 2);
}

#[tokio::test]
async fn close_computes_variance_from_submitted_count() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let s = shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 1000.0,
            note: None,
        },
    )
    .await
    .expect("open");

    // Two cash payments land in the drawer
    let mut conn = pool.acquire().await.expect("conn");
    shift::add_cash_payment_tx(&mut *conn, s.id, 250.0, shared::util::now_millis())
        .await
        .expect("cash 1");
    shift::add_cash_payment_tx(&mut *conn, s.id, 99.5, shared::util::now_millis())
        .await
        .expect("cash 2");
    drop(conn);

    // Counted 20 short
    let closed = shift::close(
        &pool,
        s.id,
        ShiftClose {
            actual_cash: 1329.5,
            note: None,
        },
    )
    .await
    .expect("close");

    assert_eq!(closed.status, ShiftStatus::Closed);
    assert_eq!(closed.expected_cash, 1349.5);
    assert_eq!(closed.actual_cash, Some(1329.5));
    assert_eq!(closed.cash_variance, Some(-20.0));
    assert!(!closed.abnormal_close);

    // Already closed: a second close is rejected
    let err = shift::close(
        &pool,
        s.id,
        ShiftClose {
            actual_cash: 0.0,
            note: None,
        },
    )
    .await
    .expect_err("double close");
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn force_close_flags_abnormal_and_skips_variance() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let s = shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 100.0,
            note: None,
        },
    )
    .await
    .expect("open");

    let closed = shift::force_close(&pool, s.id, ShiftForceClose { note: None })
        .await
        .expect("force close");

    assert_eq!(closed.status, ShiftStatus::Closed);
    assert!(closed.abnormal_close);
    assert!(closed.actual_cash.is_none());
    assert!(closed.cash_variance.is_none());
}

#[tokio::test]
async fn starting_cash_update_shifts_expected_cash() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let s = shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 100.0,
            note: None,
        },
    )
    .await
    .expect("open");

    let mut conn = pool.acquire().await.expect("conn");
    shift::add_cash_payment_tx(&mut *conn, s.id, 50.0, shared::util::now_millis())
        .await
        .expect("cash");
    drop(conn);

    let updated = shift::update(
        &pool,
        s.id,
        ShiftUpdate {
            starting_cash: Some(200.0),
            note: None,
        },
    )
    .await
    .expect("update");

    // expected = new float + received cash
    assert_eq!(updated.starting_cash, 200.0);
    assert_eq!(updated.expected_cash, 250.0);
}

#[tokio::test]
async fn stale_shift_detection_uses_business_day_start() {
    let pool = common::test_pool().await;
    let cashier = common::create_employee(&pool, "maria", "cashier", false).await;
    let s = shift::create(
        &pool,
        cashier.id,
        &cashier.display_name,
        ShiftCreate {
            starting_cash: 0.0,
            note: None,
        },
    )
    .await
    .expect("open");

    // Business day starting after the shift started → stale
    let stale = shift::find_stale_shifts(&pool, s.start_time + 1)
        .await
        .expect("stale query");
    assert_eq!(stale.len(), 1);

    // Business day starting before → not stale
    let fresh = shift::find_stale_shifts(&pool, s.start_time - 1000)
        .await
        .expect("fresh query");
    assert!(fresh.is_empty());
}
