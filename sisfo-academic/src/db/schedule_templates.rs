//! Schedule template persistence

use sisfo_common::db::{soft_delete, TenantScope};
use sisfo_common::models::{RecordMeta, ScheduleTemplate, ScheduleTemplateItem};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

const TEMPLATES: &str = "schedule_templates";
const ITEMS: &str = "schedule_template_items";

fn row_to_template(row: &SqliteRow) -> Result<ScheduleTemplate> {
    Ok(ScheduleTemplate {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        items: Vec::new(),
        meta: RecordMeta::from_row(row)?,
    })
}

fn row_to_item(row: &SqliteRow) -> Result<ScheduleTemplateItem> {
    Ok(ScheduleTemplateItem {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        template_id: get_uuid(row, "template_id")?,
        subject_id: get_opt_uuid(row, "subject_id")?,
        day_of_week: row.try_get("day_of_week")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_template<'e, E>(executor: E, t: &ScheduleTemplate) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO schedule_templates (
            id, tenant_id, name, description, is_active,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(t.id.to_string())
    .bind(&t.tenant_id)
    .bind(&t.name)
    .bind(&t.description)
    .bind(t.is_active)
    .bind(t.meta.created_at)
    .bind(t.meta.updated_at)
    .bind(t.meta.created_by.map(|u| u.to_string()))
    .bind(t.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn insert_item<'e, E>(executor: E, item: &ScheduleTemplateItem) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO schedule_template_items (
            id, tenant_id, template_id, subject_id, day_of_week, start_time, end_time,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.id.to_string())
    .bind(&item.tenant_id)
    .bind(item.template_id.to_string())
    .bind(item.subject_id.map(|u| u.to_string()))
    .bind(item.day_of_week)
    .bind(&item.start_time)
    .bind(&item.end_time)
    .bind(item.meta.created_at)
    .bind(item.meta.updated_at)
    .bind(item.meta.created_by.map(|u| u.to_string()))
    .bind(item.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await?;
    Ok(())
}

/// Template header plus its items in one transaction
pub async fn insert_template_with_items(pool: &SqlitePool, t: &ScheduleTemplate) -> Result<()> {
    let mut tx = pool.begin().await?;
    insert_template(&mut *tx, t).await?;
    for item in &t.items {
        insert_item(&mut *tx, item).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn update_template(pool: &SqlitePool, t: &ScheduleTemplate) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE schedule_templates
        SET name = ?, description = ?, is_active = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&t.name)
    .bind(&t.description)
    .bind(t.is_active)
    .bind(t.meta.updated_at)
    .bind(t.meta.updated_by.map(|u| u.to_string()))
    .bind(t.id.to_string())
    .bind(&t.tenant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Template header without items
pub async fn get_template(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<ScheduleTemplate>> {
    let row = scope.by_id(TEMPLATES, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_template).transpose()
}

pub async fn list_items(pool: &SqlitePool, scope: &TenantScope, template_id: Uuid) -> Result<Vec<ScheduleTemplateItem>> {
    let mut query = scope.select(ITEMS);
    query
        .push(" AND template_id = ")
        .push_bind(template_id.to_string())
        .push(" ORDER BY day_of_week, start_time");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_item).collect()
}

pub async fn list_templates(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<ScheduleTemplate>> {
    let mut query = scope.select(TEMPLATES);
    query.push(" ORDER BY name");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_template).collect()
}

/// Soft-delete the template header only; items become unreachable
pub async fn delete_template(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<bool> {
    soft_delete(pool, TEMPLATES, scope.tenant(), id).await
}

pub async fn delete_item(pool: &SqlitePool, scope: &TenantScope, item_id: Uuid) -> Result<bool> {
    soft_delete(pool, ITEMS, scope.tenant(), item_id).await
}
