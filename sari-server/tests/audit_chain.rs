//! Audit log hash chain: append, verify, tamper detection

mod common;

use sari_server::audit::{AuditAction, AuditQuery, AuditStorage};

#[tokio::test]
async fn chain_links_and_verifies() {
    let pool = common::test_pool().await;
    let storage = AuditStorage::new(pool.clone());

    for i in 0..5 {
        storage
            .append(
                shared::util::now_millis(),
                AuditAction::OrderCompleted,
                "order",
                &i.to_string(),
                Some(1),
                Some("maria"),
                serde_json::json!({ "total": 100.0 + i as f64 }),
            )
            .await
            .expect("append");
    }

    let entries = storage
        .query(&AuditQuery::default())
        .await
        .expect("query");
    assert_eq!(entries.len(), 5);

    // Entries chain: each prev_hash equals the previous curr_hash
    // (query returns newest first)
    for pair in entries.windows(2) {
        assert_eq!(pair[0].prev_hash, pair[1].curr_hash);
    }

    let verification = storage.verify_chain().await.expect("verify");
    assert!(verification.valid);
    assert_eq!(verification.entries_checked, 5);
}

#[tokio::test]
async fn tampering_breaks_the_chain() {
    let pool = common::test_pool().await;
    let storage = AuditStorage::new(pool.clone());

    for i in 0..3 {
        storage
            .append(
                shared::util::now_millis(),
                AuditAction::ShiftClosed,
                "shift",
                &i.to_string(),
                None,
                None,
                serde_json::json!({ "cash_variance": 0.0 }),
            )
            .await
            .expect("append");
    }

    // Tamper with the middle entry behind the storage API's back
    sqlx::query("UPDATE audit_log SET details = '{\"cash_variance\":-500.0}' WHERE id = 2")
        .execute(&pool)
        .await
        .expect("tamper");

    let verification = storage.verify_chain().await.expect("verify");
    assert!(!verification.valid);
    assert_eq!(verification.broken_at, Some(2));
}
