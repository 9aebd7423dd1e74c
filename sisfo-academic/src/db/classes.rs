//! Class persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{Class, RecordMeta};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "classes";

fn row_to_class(row: &SqliteRow) -> Result<Class> {
    Ok(Class {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        school_id: get_opt_uuid(row, "school_id")?,
        academic_year_id: get_opt_uuid(row, "academic_year_id")?,
        name: row.try_get("name")?,
        level: row.try_get("level")?,
        major: row.try_get("major")?,
        homeroom_teacher_id: get_opt_uuid(row, "homeroom_teacher_id")?,
        capacity: row.try_get("capacity")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_class(pool: &SqlitePool, c: &Class) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO classes (
            id, tenant_id, school_id, academic_year_id, name, level, major,
            homeroom_teacher_id, capacity, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(c.id.to_string())
    .bind(&c.tenant_id)
    .bind(c.school_id.map(|u| u.to_string()))
    .bind(c.academic_year_id.map(|u| u.to_string()))
    .bind(&c.name)
    .bind(c.level)
    .bind(&c.major)
    .bind(c.homeroom_teacher_id.map(|u| u.to_string()))
    .bind(c.capacity)
    .bind(c.meta.created_at)
    .bind(c.meta.updated_at)
    .bind(c.meta.created_by.map(|u| u.to_string()))
    .bind(c.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Generic over the executor so capacity checks can read inside a transaction
pub async fn get_class<'e, E>(executor: E, scope: &TenantScope, id: Uuid) -> Result<Option<Class>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = scope.by_id(TABLE, id).build().fetch_optional(executor).await?;
    row.as_ref().map(row_to_class).transpose()
}

pub async fn list_classes(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<Class>> {
    let mut query = scope.select(TABLE);
    query.push(" ORDER BY level, name");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_class).collect()
}
