//! Grade persistence
//!
//! `(tenant, student, assessment)` is unique among live rows; the index
//! backs last-writer-wins grade input.

use sisfo_common::db::TenantScope;
use sisfo_common::error::map_constraint;
use sisfo_common::models::{Grade, RecordMeta};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "grades";

fn row_to_grade(row: &SqliteRow) -> Result<Grade> {
    let status: String = row.try_get("status")?;
    Ok(Grade {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        assessment_id: get_uuid(row, "assessment_id")?,
        student_id: get_uuid(row, "student_id")?,
        score: row.try_get("score")?,
        feedback: row.try_get("feedback")?,
        notes: row.try_get("notes")?,
        status: status.parse()?,
        graded_by: get_opt_uuid(row, "graded_by")?,
        approved_by: get_opt_uuid(row, "approved_by")?,
        approved_at: row.try_get("approved_at")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_grade<'e, E>(executor: E, g: &Grade) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO grades (
            id, tenant_id, assessment_id, student_id, score, feedback, notes, status,
            graded_by, approved_by, approved_at, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(g.id.to_string())
    .bind(&g.tenant_id)
    .bind(g.assessment_id.to_string())
    .bind(g.student_id.to_string())
    .bind(g.score)
    .bind(&g.feedback)
    .bind(&g.notes)
    .bind(g.status.as_str())
    .bind(g.graded_by.map(|u| u.to_string()))
    .bind(g.approved_by.map(|u| u.to_string()))
    .bind(g.approved_at)
    .bind(g.meta.created_at)
    .bind(g.meta.updated_at)
    .bind(g.meta.created_by.map(|u| u.to_string()))
    .bind(g.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await
    .map_err(|e| map_constraint(e, "grade for this student and assessment"))?;
    Ok(())
}

pub async fn update_grade<'e, E>(executor: E, g: &Grade) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE grades
        SET score = ?, feedback = ?, notes = ?, status = ?, graded_by = ?,
            approved_by = ?, approved_at = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(g.score)
    .bind(&g.feedback)
    .bind(&g.notes)
    .bind(g.status.as_str())
    .bind(g.graded_by.map(|u| u.to_string()))
    .bind(g.approved_by.map(|u| u.to_string()))
    .bind(g.approved_at)
    .bind(g.meta.updated_at)
    .bind(g.meta.updated_by.map(|u| u.to_string()))
    .bind(g.id.to_string())
    .bind(&g.tenant_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_grade(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Grade>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_grade).transpose()
}

/// The live grade a student holds for an assessment, if any
pub async fn get_by_student_and_assessment<'e, E>(
    executor: E,
    scope: &TenantScope,
    student_id: Uuid,
    assessment_id: Uuid,
) -> Result<Option<Grade>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = scope.select(TABLE);
    query
        .push(" AND student_id = ")
        .push_bind(student_id.to_string())
        .push(" AND assessment_id = ")
        .push_bind(assessment_id.to_string());
    let row = query.build().fetch_optional(executor).await?;
    row.as_ref().map(row_to_grade).transpose()
}

pub async fn list_by_student(pool: &SqlitePool, scope: &TenantScope, student_id: Uuid) -> Result<Vec<Grade>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND student_id = ")
        .push_bind(student_id.to_string())
        .push(" ORDER BY created_at");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_grade).collect()
}
