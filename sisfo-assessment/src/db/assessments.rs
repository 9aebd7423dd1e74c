//! Assessment persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{Assessment, RecordMeta};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "assessments";

fn row_to_assessment(row: &SqliteRow) -> Result<Assessment> {
    Ok(Assessment {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        grade_category_id: get_uuid(row, "grade_category_id")?,
        teacher_id: get_uuid(row, "teacher_id")?,
        subject_id: get_uuid(row, "subject_id")?,
        class_id: get_uuid(row, "class_id")?,
        semester_id: get_opt_uuid(row, "semester_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        max_score: row.try_get("max_score")?,
        date: row.try_get("date")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_assessment(pool: &SqlitePool, a: &Assessment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO assessments (
            id, tenant_id, grade_category_id, teacher_id, subject_id, class_id, semester_id,
            name, description, max_score, date, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(a.id.to_string())
    .bind(&a.tenant_id)
    .bind(a.grade_category_id.to_string())
    .bind(a.teacher_id.to_string())
    .bind(a.subject_id.to_string())
    .bind(a.class_id.to_string())
    .bind(a.semester_id.map(|u| u.to_string()))
    .bind(&a.name)
    .bind(&a.description)
    .bind(a.max_score)
    .bind(a.date)
    .bind(a.meta.created_at)
    .bind(a.meta.updated_at)
    .bind(a.meta.created_by.map(|u| u.to_string()))
    .bind(a.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_assessment(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Assessment>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_assessment).transpose()
}

/// Assessments of one class and subject, most recent first
pub async fn get_by_class_and_subject(
    pool: &SqlitePool,
    scope: &TenantScope,
    class_id: Uuid,
    subject_id: Uuid,
) -> Result<Vec<Assessment>> {
    list_assessments(pool, scope, Some(class_id), Some(subject_id)).await
}

/// Assessments with optional class and subject filters, most recent first
pub async fn list_assessments(
    pool: &SqlitePool,
    scope: &TenantScope,
    class_id: Option<Uuid>,
    subject_id: Option<Uuid>,
) -> Result<Vec<Assessment>> {
    let mut query = scope.select(TABLE);
    if let Some(class_id) = class_id {
        query.push(" AND class_id = ").push_bind(class_id.to_string());
    }
    if let Some(subject_id) = subject_id {
        query.push(" AND subject_id = ").push_bind(subject_id.to_string());
    }
    query.push(" ORDER BY date DESC, created_at DESC");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_assessment).collect()
}
