//! Grade category persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{GradeCategory, RecordMeta};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

pub const TABLE: &str = "grade_categories";

fn row_to_category(row: &SqliteRow) -> Result<GradeCategory> {
    Ok(GradeCategory {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        weight: row.try_get("weight")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_category(pool: &SqlitePool, c: &GradeCategory) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO grade_categories (
            id, tenant_id, name, description, weight, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(c.id.to_string())
    .bind(&c.tenant_id)
    .bind(&c.name)
    .bind(&c.description)
    .bind(c.weight)
    .bind(c.meta.created_at)
    .bind(c.meta.updated_at)
    .bind(c.meta.created_by.map(|u| u.to_string()))
    .bind(c.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_category(pool: &SqlitePool, c: &GradeCategory) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE grade_categories
        SET name = ?, description = ?, weight = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&c.name)
    .bind(&c.description)
    .bind(c.weight)
    .bind(c.meta.updated_at)
    .bind(c.meta.updated_by.map(|u| u.to_string()))
    .bind(c.id.to_string())
    .bind(&c.tenant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_category(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<GradeCategory>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_category).transpose()
}

pub async fn list_categories(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<GradeCategory>> {
    let mut query = scope.select(TABLE);
    query.push(" ORDER BY name");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_category).collect()
}

/// Live category weights keyed by category id
pub async fn weights(pool: &SqlitePool, scope: &TenantScope) -> Result<HashMap<Uuid, f64>> {
    Ok(list_categories(pool, scope)
        .await?
        .into_iter()
        .map(|c| (c.id, c.weight))
        .collect())
}
