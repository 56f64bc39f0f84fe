//! Shared fixtures for integration tests
#![allow(dead_code)]

use sqlx::SqlitePool;

use sari_server::db::repository::{customer, employee, vehicle};
use sari_server::db::{DbService, seed};
use shared::models::{
    Customer, CustomerCreate, EmployeeCreate, EmployeeResponse, Product, ProductCreate, Vehicle,
    VehicleCreate,
};

/// Fresh in-memory database with migrations + default seed applied
pub async fn test_pool() -> SqlitePool {
    let db = DbService::in_memory().await.expect("in-memory db");
    seed::ensure_defaults(&db.pool).await.expect("seed defaults");
    db.pool
}

pub async fn create_employee(
    pool: &SqlitePool,
    username: &str,
    role_name: &str,
    is_rider: bool,
) -> EmployeeResponse {
    let role = sari_server::db::repository::role::find_by_name(pool, role_name)
        .await
        .expect("role query")
        .expect("role exists");
    let hash = sari_server::auth::hash_password("secret-password").expect("hash");
    employee::create(
        pool,
        &EmployeeCreate {
            username: username.to_string(),
            display_name: username.to_string(),
            password: String::new(),
            role_id: role.id,
            phone: None,
            is_rider,
        },
        &hash,
    )
    .await
    .expect("create employee")
}

pub async fn create_customer(pool: &SqlitePool, name: &str, phone: &str) -> Customer {
    customer::create(
        pool,
        &CustomerCreate {
            name: name.to_string(),
            phone: phone.to_string(),
            address: Some("123 Mabini St".to_string()),
            notes: None,
        },
        phone,
    )
    .await
    .expect("create customer")
}

pub async fn create_vehicle(
    pool: &SqlitePool,
    plate_no: &str,
    max_load_kg: f64,
    max_stops: i64,
) -> Vehicle {
    vehicle::create(
        pool,
        &VehicleCreate {
            name: format!("Trike {plate_no}"),
            plate_no: plate_no.to_string(),
            max_load_kg,
            max_stops,
        },
    )
    .await
    .expect("create vehicle")
}

pub struct ProductSpec {
    pub sku: &'static str,
    pub price: f64,
    pub unit_weight_kg: f64,
    pub track_stock: bool,
    pub stock_qty: i64,
    pub component_product_id: Option<i64>,
    pub component_qty: i64,
}

impl Default for ProductSpec {
    fn default() -> Self {
        Self {
            sku: "SKU",
            price: 100.0,
            unit_weight_kg: 0.0,
            track_stock: false,
            stock_qty: 0,
            component_product_id: None,
            component_qty: 1,
        }
    }
}

pub async fn create_product(pool: &SqlitePool, spec: ProductSpec) -> Product {
    sari_server::db::repository::product::create(
        pool,
        &ProductCreate {
            sku: spec.sku.to_string(),
            name: format!("Product {}", spec.sku),
            category_id: None,
            price: spec.price,
            unit_weight_kg: spec.unit_weight_kg,
            track_stock: spec.track_stock,
            stock_qty: spec.stock_qty,
            component_product_id: spec.component_product_id,
            component_qty: spec.component_qty,
        },
    )
    .await
    .expect("create product")
}
