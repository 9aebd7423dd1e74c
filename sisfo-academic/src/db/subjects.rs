//! Subject persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{RecordMeta, Subject};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "subjects";

fn row_to_subject(row: &SqliteRow) -> Result<Subject> {
    Ok(Subject {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        credit_units: row.try_get("credit_units")?,
        subject_type: row.try_get("subject_type")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_subject(pool: &SqlitePool, s: &Subject) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subjects (
            id, tenant_id, code, name, description, credit_units, subject_type,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(s.id.to_string())
    .bind(&s.tenant_id)
    .bind(&s.code)
    .bind(&s.name)
    .bind(&s.description)
    .bind(s.credit_units)
    .bind(&s.subject_type)
    .bind(s.meta.created_at)
    .bind(s.meta.updated_at)
    .bind(s.meta.created_by.map(|u| u.to_string()))
    .bind(s.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_subject(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Subject>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_subject).transpose()
}

pub async fn list_subjects(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<Subject>> {
    let mut query = scope.select(TABLE);
    query.push(" ORDER BY code");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_subject).collect()
}
