//! Database bootstrap: file-backed pool, migrations, idempotent seeding

use sari_server::db::{DbService, seed};

#[tokio::test]
async fn opens_file_database_and_seeds_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sari.db");

    let db = DbService::new(&path.to_string_lossy())
        .await
        .expect("open database");
    seed::ensure_defaults(&db.pool).await.expect("seed");

    // Seeding again must be a no-op
    seed::ensure_defaults(&db.pool).await.expect("seed twice");

    let roles = sari_server::db::repository::role::find_all(&db.pool)
        .await
        .expect("roles");
    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    for expected in ["admin", "manager", "cashier", "rider"] {
        assert!(names.contains(&expected), "missing role {expected}");
    }

    // Exactly one admin account seeded
    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee")
        .fetch_one(&db.pool)
        .await
        .expect("count");
    assert_eq!(admins, 1);

    let info = sari_server::db::repository::store_info::get(&db.pool)
        .await
        .expect("store info")
        .expect("seeded");
    assert_eq!(info.business_day_cutoff, "02:00");
}
