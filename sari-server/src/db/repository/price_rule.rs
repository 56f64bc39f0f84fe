//! Price Rule Repository
//!
//! 互斥规则不允许时间窗重叠：创建/激活在事务内检查同
//! (product_scope, target_id, channel_scope) 的其他激活互斥规则。

use super::{RepoError, RepoResult};
use shared::models::{
    ChannelScope, PriceRule, PriceRuleCreate, PriceRuleUpdate, Product, ProductScope,
};
use sqlx::SqlitePool;

const RULE_SELECT: &str = "SELECT id, name, display_name, receipt_name, description, rule_type, product_scope, target_id, channel_scope, adjustment_type, adjustment_value, is_stackable, is_exclusive, valid_from, valid_until, active_days, active_start_time, active_end_time, is_active, created_by, created_at, updated_at FROM price_rule";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<PriceRule>> {
    let sql = format!("{RULE_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, PriceRule>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<PriceRule>> {
    let sql = format!("{RULE_SELECT} WHERE is_active = 1");
    let rows = sqlx::query_as::<_, PriceRule>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PriceRule>> {
    let sql = format!("{RULE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, PriceRule>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Active rules that could apply to a product (any channel/time; the engine
/// does the fine-grained matching)
pub async fn find_for_product(pool: &SqlitePool, product: &Product) -> RepoResult<Vec<PriceRule>> {
    let sql = format!(
        "{RULE_SELECT} WHERE is_active = 1 AND (product_scope = 'GLOBAL' OR (product_scope = 'PRODUCT' AND target_id = ?1) OR (product_scope = 'CATEGORY' AND target_id IS ?2))"
    );
    let rows = sqlx::query_as::<_, PriceRule>(&sql)
        .bind(product.id)
        .bind(product.category_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Whether two validity windows overlap (None = unbounded on that side)
fn windows_overlap(
    a_from: Option<i64>,
    a_until: Option<i64>,
    b_from: Option<i64>,
    b_until: Option<i64>,
) -> bool {
    let a_from = a_from.unwrap_or(i64::MIN);
    let a_until = a_until.unwrap_or(i64::MAX);
    let b_from = b_from.unwrap_or(i64::MIN);
    let b_until = b_until.unwrap_or(i64::MAX);
    a_from <= b_until && b_from <= a_until
}

/// Reject when another active exclusive rule with the same scope/target/
/// channel overlaps the candidate's validity window. Runs on the given
/// executor so callers can hold it inside their write transaction.
async fn check_exclusive_overlap(
    conn: &mut sqlx::SqliteConnection,
    exclude_id: Option<i64>,
    product_scope: ProductScope,
    target_id: Option<i64>,
    channel_scope: ChannelScope,
    valid_from: Option<i64>,
    valid_until: Option<i64>,
) -> RepoResult<()> {
    let sql = format!(
        "{RULE_SELECT} WHERE is_active = 1 AND is_exclusive = 1 AND product_scope = ?1 AND target_id IS ?2 AND channel_scope = ?3 AND id != ?4"
    );
    let others = sqlx::query_as::<_, PriceRule>(&sql)
        .bind(product_scope)
        .bind(target_id)
        .bind(channel_scope)
        .bind(exclude_id.unwrap_or(0))
        .fetch_all(&mut *conn)
        .await?;

    for other in &others {
        if windows_overlap(valid_from, valid_until, other.valid_from, other.valid_until) {
            return Err(RepoError::Duplicate(format!(
                "Overlaps active exclusive rule '{}' ({})",
                other.name, other.id
            )));
        }
    }
    Ok(())
}

pub async fn create(pool: &SqlitePool, data: PriceRuleCreate) -> RepoResult<PriceRule> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let channel_scope = data.channel_scope.unwrap_or(ChannelScope::All);
    let is_exclusive = data.is_exclusive.unwrap_or(false);
    let active_days = serde_json::to_string(&data.active_days)
        .map_err(|e| RepoError::Validation(format!("Invalid active_days: {e}")))?;

    let mut tx = pool.begin().await?;

    if is_exclusive {
        check_exclusive_overlap(
            &mut *tx,
            None,
            data.product_scope,
            data.target_id,
            channel_scope,
            data.valid_from,
            data.valid_until,
        )
        .await?;
    }

    sqlx::query(
        "INSERT INTO price_rule (id, name, display_name, receipt_name, description, rule_type, product_scope, target_id, channel_scope, adjustment_type, adjustment_value, is_stackable, is_exclusive, valid_from, valid_until, active_days, active_start_time, active_end_time, is_active, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, 1, ?19, ?20, ?20)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.display_name)
    .bind(&data.receipt_name)
    .bind(&data.description)
    .bind(data.rule_type)
    .bind(data.product_scope)
    .bind(data.target_id)
    .bind(channel_scope)
    .bind(data.adjustment_type)
    .bind(data.adjustment_value)
    .bind(data.is_stackable.unwrap_or(true))
    .bind(is_exclusive)
    .bind(data.valid_from)
    .bind(data.valid_until)
    .bind(&active_days)
    .bind(&data.active_start_time)
    .bind(&data.active_end_time)
    .bind(data.created_by)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create price rule".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: PriceRuleUpdate) -> RepoResult<PriceRule> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Price rule {id} not found")))?;

    // Effective post-update values drive the overlap check
    let product_scope = data.product_scope.unwrap_or(existing.product_scope);
    let target_id = data.target_id.or(existing.target_id);
    let channel_scope = data.channel_scope.unwrap_or(existing.channel_scope);
    let is_exclusive = data.is_exclusive.unwrap_or(existing.is_exclusive);
    let is_active = data.is_active.unwrap_or(existing.is_active);
    let valid_from = data.valid_from.or(existing.valid_from);
    let valid_until = data.valid_until.or(existing.valid_until);
    let active_days = match &data.active_days {
        Some(days) => Some(
            serde_json::to_string(days)
                .map_err(|e| RepoError::Validation(format!("Invalid active_days: {e}")))?,
        ),
        None => None,
    };

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    if is_active && is_exclusive {
        check_exclusive_overlap(
            &mut *tx,
            Some(id),
            product_scope,
            target_id,
            channel_scope,
            valid_from,
            valid_until,
        )
        .await?;
    }

    let rows = sqlx::query(
        "UPDATE price_rule SET name = COALESCE(?1, name), display_name = COALESCE(?2, display_name), receipt_name = COALESCE(?3, receipt_name), description = COALESCE(?4, description), rule_type = COALESCE(?5, rule_type), product_scope = COALESCE(?6, product_scope), target_id = COALESCE(?7, target_id), channel_scope = COALESCE(?8, channel_scope), adjustment_type = COALESCE(?9, adjustment_type), adjustment_value = COALESCE(?10, adjustment_value), is_stackable = COALESCE(?11, is_stackable), is_exclusive = COALESCE(?12, is_exclusive), valid_from = COALESCE(?13, valid_from), valid_until = COALESCE(?14, valid_until), active_days = COALESCE(?15, active_days), active_start_time = COALESCE(?16, active_start_time), active_end_time = COALESCE(?17, active_end_time), is_active = COALESCE(?18, is_active), updated_at = ?19 WHERE id = ?20",
    )
    .bind(&data.name)
    .bind(&data.display_name)
    .bind(&data.receipt_name)
    .bind(&data.description)
    .bind(data.rule_type)
    .bind(data.product_scope)
    .bind(data.target_id)
    .bind(data.channel_scope)
    .bind(data.adjustment_type)
    .bind(data.adjustment_value)
    .bind(data.is_stackable)
    .bind(data.is_exclusive)
    .bind(data.valid_from)
    .bind(data.valid_until)
    .bind(active_days)
    .bind(&data.active_start_time)
    .bind(&data.active_end_time)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Price rule {id} not found")));
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Price rule {id} not found")))
}

/// Soft delete (deactivate)
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE price_rule SET is_active = 0, updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_windows_always_overlap() {
        assert!(windows_overlap(None, None, None, None));
        assert!(windows_overlap(None, None, Some(100), Some(200)));
    }

    #[test]
    fn disjoint_windows_do_not_overlap() {
        assert!(!windows_overlap(Some(0), Some(99), Some(100), Some(200)));
        assert!(!windows_overlap(Some(100), Some(200), Some(0), Some(99)));
    }

    #[test]
    fn touching_windows_overlap() {
        assert!(windows_overlap(Some(0), Some(100), Some(100), Some(200)));
    }

    #[test]
    fn half_open_windows() {
        assert!(windows_overlap(Some(100), None, Some(0), Some(150)));
        assert!(!windows_overlap(Some(200), None, Some(0), Some(150)));
    }
}
