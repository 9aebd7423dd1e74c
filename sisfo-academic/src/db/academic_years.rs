//! Academic year persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{AcademicYear, RecordMeta};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "academic_years";

fn row_to_year(row: &SqliteRow) -> Result<AcademicYear> {
    Ok(AcademicYear {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        is_active: row.try_get("is_active")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_academic_year(pool: &SqlitePool, y: &AcademicYear) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO academic_years (
            id, tenant_id, name, start_date, end_date, is_active,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(y.id.to_string())
    .bind(&y.tenant_id)
    .bind(&y.name)
    .bind(y.start_date)
    .bind(y.end_date)
    .bind(y.is_active)
    .bind(y.meta.created_at)
    .bind(y.meta.updated_at)
    .bind(y.meta.created_by.map(|u| u.to_string()))
    .bind(y.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_academic_year(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<AcademicYear>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_year).transpose()
}

pub async fn list_academic_years(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<AcademicYear>> {
    let mut query = scope.select(TABLE);
    query.push(" ORDER BY start_date DESC");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_year).collect()
}
