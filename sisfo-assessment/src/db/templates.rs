//! Report card template persistence
//!
//! `config` is stored as a JSON document. The partial unique index on
//! `(tenant_id) WHERE is_default = 1` backs the single-default rule, so
//! callers clear the old default before setting a new one in the same
//! transaction.

use sisfo_common::db::TenantScope;
use sisfo_common::error::map_constraint;
use sisfo_common::models::{RecordMeta, ReportCardTemplate, TemplateConfig};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

pub const TABLE: &str = "report_card_templates";

fn row_to_template(row: &SqliteRow) -> Result<ReportCardTemplate> {
    let Json(config): Json<TemplateConfig> = row.try_get("config")?;
    Ok(ReportCardTemplate {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        config,
        is_default: row.try_get("is_default")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_template<'e, E>(executor: E, t: &ReportCardTemplate) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO report_card_templates (
            id, tenant_id, name, config, is_default, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(t.id.to_string())
    .bind(&t.tenant_id)
    .bind(&t.name)
    .bind(Json(&t.config))
    .bind(t.is_default)
    .bind(t.meta.created_at)
    .bind(t.meta.updated_at)
    .bind(t.meta.created_by.map(|u| u.to_string()))
    .bind(t.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await
    .map_err(|e| map_constraint(e, "default template for this tenant"))?;
    Ok(())
}

pub async fn update_template<'e, E>(executor: E, t: &ReportCardTemplate) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE report_card_templates
        SET name = ?, config = ?, is_default = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&t.name)
    .bind(Json(&t.config))
    .bind(t.is_default)
    .bind(t.meta.updated_at)
    .bind(t.meta.updated_by.map(|u| u.to_string()))
    .bind(t.id.to_string())
    .bind(&t.tenant_id)
    .execute(executor)
    .await
    .map_err(|e| map_constraint(e, "default template for this tenant"))?;
    Ok(result.rows_affected() > 0)
}

/// Drop the default flag from every template of the tenant except `keep`
pub async fn clear_default<'e, E>(executor: E, tenant: &str, keep: Uuid) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE report_card_templates SET is_default = 0 \
         WHERE tenant_id = ? AND id <> ? AND is_default = 1 AND deleted_at IS NULL",
    )
    .bind(tenant)
    .bind(keep.to_string())
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_templates<'e, E>(executor: E, scope: &TenantScope) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = scope.count(TABLE);
    Ok(query.build_query_scalar().fetch_one(executor).await?)
}

pub async fn get_template(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<ReportCardTemplate>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_template).transpose()
}

/// Newest first
pub async fn list_templates(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<ReportCardTemplate>> {
    let mut query = scope.select(TABLE);
    query.push(" ORDER BY created_at DESC");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_template).collect()
}

pub async fn get_default(pool: &SqlitePool, scope: &TenantScope) -> Result<Option<ReportCardTemplate>> {
    let mut query = scope.select(TABLE);
    query.push(" AND is_default = 1 LIMIT 1");
    let row = query.build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_template).transpose()
}
