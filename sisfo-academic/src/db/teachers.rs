//! Teacher persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{RecordMeta, Teacher};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "teachers";

fn row_to_teacher(row: &SqliteRow) -> Result<Teacher> {
    Ok(Teacher {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        nip: row.try_get("nip")?,
        name: row.try_get("name")?,
        gender: row.try_get("gender")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        status: row.try_get("status")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_teacher(pool: &SqlitePool, t: &Teacher) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO teachers (
            id, tenant_id, nip, name, gender, phone, email, status,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(t.id.to_string())
    .bind(&t.tenant_id)
    .bind(&t.nip)
    .bind(&t.name)
    .bind(&t.gender)
    .bind(&t.phone)
    .bind(&t.email)
    .bind(&t.status)
    .bind(t.meta.created_at)
    .bind(t.meta.updated_at)
    .bind(t.meta.created_by.map(|u| u.to_string()))
    .bind(t.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_teacher(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Teacher>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_teacher).transpose()
}

pub async fn list_teachers(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<Teacher>> {
    let mut query = scope.select(TABLE);
    query.push(" ORDER BY name");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_teacher).collect()
}
