//! Customer phone normalization + dedupe against the UNIQUE index

mod common;

use sari_server::db::repository::{RepoError, customer};
use sari_server::utils::phone::normalize_phone;
use shared::models::CustomerCreate;

#[tokio::test]
async fn same_number_different_spelling_is_a_conflict() {
    let pool = common::test_pool().await;

    let first_raw = "0917 123 4567";
    let first = customer::create(
        &pool,
        &CustomerCreate {
            name: "Aling Nena".to_string(),
            phone: first_raw.to_string(),
            address: None,
            notes: None,
        },
        &normalize_phone(first_raw).expect("normalize"),
    )
    .await
    .expect("first customer");
    assert_eq!(first.phone, "+639171234567");

    // Same mobile typed internationally
    let second_raw = "+63 917-123-4567";
    let err = customer::create(
        &pool,
        &CustomerCreate {
            name: "Nena N.".to_string(),
            phone: second_raw.to_string(),
            address: None,
            notes: None,
        },
        &normalize_phone(second_raw).expect("normalize"),
    )
    .await
    .expect_err("duplicate phone");
    assert!(matches!(err, RepoError::Duplicate(_)));

    // Lookup by canonical form finds the original
    let found = customer::find_by_phone(&pool, "+639171234567")
        .await
        .expect("query")
        .expect("customer");
    assert_eq!(found.id, first.id);
}
