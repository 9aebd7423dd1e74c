//! Enrollment persistence

use sisfo_common::db::{soft_delete, TenantScope};
use sisfo_common::error::map_constraint;
use sisfo_common::models::{Enrollment, EnrollmentStatus, RecordMeta};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "enrollments";

fn row_to_enrollment(row: &SqliteRow) -> Result<Enrollment> {
    let status: String = row.try_get("status")?;
    Ok(Enrollment {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        class_id: get_uuid(row, "class_id")?,
        student_id: get_uuid(row, "student_id")?,
        status: status.parse()?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_enrollment<'e, E>(executor: E, e: &Enrollment) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO enrollments (
            id, tenant_id, class_id, student_id, status,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(e.id.to_string())
    .bind(&e.tenant_id)
    .bind(e.class_id.to_string())
    .bind(e.student_id.to_string())
    .bind(e.status.as_str())
    .bind(e.meta.created_at)
    .bind(e.meta.updated_at)
    .bind(e.meta.created_by.map(|u| u.to_string()))
    .bind(e.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await
    .map_err(|err| map_constraint(err, "enrollment for this student and class"))?;
    Ok(())
}

pub async fn update_status<'e, E>(executor: E, e: &Enrollment) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE enrollments
        SET status = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(e.status.as_str())
    .bind(e.meta.updated_at)
    .bind(e.meta.updated_by.map(|u| u.to_string()))
    .bind(e.id.to_string())
    .bind(&e.tenant_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Active, non-deleted enrollments of a class
pub async fn count_active<'e, E>(executor: E, scope: &TenantScope, class_id: Uuid) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = scope.count(TABLE);
    query
        .push(" AND status = ")
        .push_bind(EnrollmentStatus::Active.as_str())
        .push(" AND class_id = ")
        .push_bind(class_id.to_string());
    Ok(query.build_query_scalar().fetch_one(executor).await?)
}

pub async fn get_enrollment<'e, E>(executor: E, scope: &TenantScope, id: Uuid) -> Result<Option<Enrollment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = scope.by_id(TABLE, id).build().fetch_optional(executor).await?;
    row.as_ref().map(row_to_enrollment).transpose()
}

pub async fn list_by_class(pool: &SqlitePool, scope: &TenantScope, class_id: Uuid) -> Result<Vec<Enrollment>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND class_id = ")
        .push_bind(class_id.to_string())
        .push(" ORDER BY created_at");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_enrollment).collect()
}

pub async fn list_by_student(pool: &SqlitePool, scope: &TenantScope, student_id: Uuid) -> Result<Vec<Enrollment>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND student_id = ")
        .push_bind(student_id.to_string())
        .push(" ORDER BY created_at DESC");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_enrollment).collect()
}

pub async fn delete_enrollment(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<bool> {
    soft_delete(pool, TABLE, scope.tenant(), id).await
}
