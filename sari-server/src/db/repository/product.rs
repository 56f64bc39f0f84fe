//! Product Repository

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::SqlitePool;

const PRODUCT_SELECT: &str = "SELECT id, sku, name, category_id, price, unit_weight_kg, track_stock, stock_qty, component_product_id, component_qty, is_active, created_at, updated_at FROM product";

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<Product>> {
    let sql = if include_inactive {
        format!("{PRODUCT_SELECT} ORDER BY name")
    } else {
        format!("{PRODUCT_SELECT} WHERE is_active = 1 ORDER BY name")
    };
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetch a batch of products by ID (order creation)
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("{PRODUCT_SELECT} WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, Product>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: &ProductCreate) -> RepoResult<Product> {
    if let Some(component_id) = data.component_product_id {
        let component = find_by_id(pool, component_id)
            .await?
            .ok_or_else(|| RepoError::Validation(format!("Component product {component_id} not found")))?;
        if component.component_product_id.is_some() {
            return Err(RepoError::Validation(
                "Component products cannot themselves have components".into(),
            ));
        }
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO product (id, sku, name, category_id, price, unit_weight_kg, track_stock, stock_qty, component_product_id, component_qty, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)",
    )
    .bind(id)
    .bind(&data.sku)
    .bind(&data.name)
    .bind(data.category_id)
    .bind(data.price)
    .bind(data.unit_weight_kg)
    .bind(data.track_stock)
    .bind(data.stock_qty)
    .bind(data.component_product_id)
    .bind(data.component_qty)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &ProductUpdate) -> RepoResult<Product> {
    if let Some(component_id) = data.component_product_id {
        if component_id == id {
            return Err(RepoError::Validation(
                "A product cannot be its own component".into(),
            ));
        }
        if find_by_id(pool, component_id).await?.is_none() {
            return Err(RepoError::Validation(format!(
                "Component product {component_id} not found"
            )));
        }
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET sku = COALESCE(?1, sku), name = COALESCE(?2, name), category_id = COALESCE(?3, category_id), price = COALESCE(?4, price), unit_weight_kg = COALESCE(?5, unit_weight_kg), track_stock = COALESCE(?6, track_stock), component_product_id = COALESCE(?7, component_product_id), component_qty = COALESCE(?8, component_qty), is_active = COALESCE(?9, is_active), updated_at = ?10 WHERE id = ?11",
    )
    .bind(&data.sku)
    .bind(&data.name)
    .bind(data.category_id)
    .bind(data.price)
    .bind(data.unit_weight_kg)
    .bind(data.track_stock)
    .bind(data.component_product_id)
    .bind(data.component_qty)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Manual stock adjustment (stocktake correction, spoilage, restock)
pub async fn adjust_stock(pool: &SqlitePool, id: i64, delta: i64) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET stock_qty = stock_qty + ?1, updated_at = ?2 WHERE id = ?3 AND track_stock = 1",
    )
    .bind(delta)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Product {id} not found or does not track stock"
        )));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}
