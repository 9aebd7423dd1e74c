//! Class-subject assignment persistence

use sisfo_common::db::TenantScope;
use sisfo_common::error::map_constraint;
use sisfo_common::models::{ClassSubject, RecordMeta};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "class_subjects";

fn row_to_class_subject(row: &SqliteRow) -> Result<ClassSubject> {
    Ok(ClassSubject {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        class_id: get_uuid(row, "class_id")?,
        subject_id: get_uuid(row, "subject_id")?,
        teacher_id: get_opt_uuid(row, "teacher_id")?,
        meta: RecordMeta::from_row(row)?,
    })
}

/// Insert; the partial unique index turns a duplicate into `Conflict`
pub async fn insert_class_subject(pool: &SqlitePool, cs: &ClassSubject) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO class_subjects (
            id, tenant_id, class_id, subject_id, teacher_id,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(cs.id.to_string())
    .bind(&cs.tenant_id)
    .bind(cs.class_id.to_string())
    .bind(cs.subject_id.to_string())
    .bind(cs.teacher_id.map(|u| u.to_string()))
    .bind(cs.meta.created_at)
    .bind(cs.meta.updated_at)
    .bind(cs.meta.created_by.map(|u| u.to_string()))
    .bind(cs.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await
    .map_err(|e| match map_constraint(e, "class subject") {
        Error::Conflict(_) => Error::Conflict("subject already assigned to this class".to_string()),
        other => other,
    })?;
    Ok(())
}

pub async fn find(pool: &SqlitePool, scope: &TenantScope, class_id: Uuid, subject_id: Uuid) -> Result<Option<ClassSubject>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND class_id = ")
        .push_bind(class_id.to_string())
        .push(" AND subject_id = ")
        .push_bind(subject_id.to_string());
    let row = query.build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_class_subject).transpose()
}

pub async fn list_by_class(pool: &SqlitePool, scope: &TenantScope, class_id: Uuid) -> Result<Vec<ClassSubject>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND class_id = ")
        .push_bind(class_id.to_string())
        .push(" ORDER BY created_at");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_class_subject).collect()
}

pub async fn set_teacher(pool: &SqlitePool, cs: &ClassSubject) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE class_subjects
        SET teacher_id = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(cs.teacher_id.map(|u| u.to_string()))
    .bind(cs.meta.updated_at)
    .bind(cs.meta.updated_by.map(|u| u.to_string()))
    .bind(cs.id.to_string())
    .bind(&cs.tenant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_class_subject(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<bool> {
    sisfo_common::db::soft_delete(pool, TABLE, scope.tenant(), id).await
}
