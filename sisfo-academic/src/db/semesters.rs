//! Semester persistence

use sisfo_common::db::TenantScope;
use sisfo_common::error::map_constraint;
use sisfo_common::models::{RecordMeta, Semester};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "semesters";

fn row_to_semester(row: &SqliteRow) -> Result<Semester> {
    let semester_type: String = row.try_get("semester_type")?;
    Ok(Semester {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        academic_year_id: get_uuid(row, "academic_year_id")?,
        curriculum_id: get_opt_uuid(row, "curriculum_id")?,
        name: row.try_get("name")?,
        semester_type: semester_type.parse()?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        is_active: row.try_get("is_active")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_semester<'e, E>(executor: E, s: &Semester) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO semesters (
            id, tenant_id, academic_year_id, curriculum_id, name, semester_type,
            start_date, end_date, is_active, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(s.id.to_string())
    .bind(&s.tenant_id)
    .bind(s.academic_year_id.to_string())
    .bind(s.curriculum_id.map(|u| u.to_string()))
    .bind(&s.name)
    .bind(s.semester_type.as_str())
    .bind(s.start_date)
    .bind(s.end_date)
    .bind(s.is_active)
    .bind(s.meta.created_at)
    .bind(s.meta.updated_at)
    .bind(s.meta.created_by.map(|u| u.to_string()))
    .bind(s.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await
    .map_err(|e| map_constraint(e, "active semester for this academic year"))?;
    Ok(())
}

pub async fn update_semester<'e, E>(executor: E, s: &Semester) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE semesters
        SET academic_year_id = ?, curriculum_id = ?, name = ?, semester_type = ?,
            start_date = ?, end_date = ?, is_active = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(s.academic_year_id.to_string())
    .bind(s.curriculum_id.map(|u| u.to_string()))
    .bind(&s.name)
    .bind(s.semester_type.as_str())
    .bind(s.start_date)
    .bind(s.end_date)
    .bind(s.is_active)
    .bind(s.meta.updated_at)
    .bind(s.meta.updated_by.map(|u| u.to_string()))
    .bind(s.id.to_string())
    .bind(&s.tenant_id)
    .execute(executor)
    .await
    .map_err(|e| map_constraint(e, "active semester for this academic year"))?;
    Ok(result.rows_affected() > 0)
}

/// Clear `is_active` on every other semester of the academic year
pub async fn deactivate_others<'e, E>(
    executor: E,
    tenant: &str,
    academic_year_id: Uuid,
    keep_id: Uuid,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE semesters
        SET is_active = 0, updated_at = ?
        WHERE tenant_id = ? AND academic_year_id = ? AND id <> ?
          AND is_active = 1 AND deleted_at IS NULL
        "#,
    )
    .bind(sisfo_common::time::now())
    .bind(tenant)
    .bind(academic_year_id.to_string())
    .bind(keep_id.to_string())
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn get_semester(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Semester>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_semester).transpose()
}

/// All semesters, optionally restricted to one academic year
pub async fn list_semesters(
    pool: &SqlitePool,
    scope: &TenantScope,
    academic_year_id: Option<Uuid>,
) -> Result<Vec<Semester>> {
    let mut query = scope.select(TABLE);
    if let Some(year) = academic_year_id {
        query.push(" AND academic_year_id = ").push_bind(year.to_string());
    }
    query.push(" ORDER BY start_date");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_semester).collect()
}

pub async fn count_active_in_year(pool: &SqlitePool, scope: &TenantScope, academic_year_id: Uuid) -> Result<i64> {
    let mut query = scope.count(TABLE);
    query
        .push(" AND is_active = 1 AND academic_year_id = ")
        .push_bind(academic_year_id.to_string());
    Ok(query.build_query_scalar().fetch_one(pool).await?)
}
