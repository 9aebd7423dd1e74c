//! Curriculum, curriculum-subject and grading-rule persistence

use sisfo_common::db::TenantScope;
use sisfo_common::models::{Curriculum, CurriculumSubject, GradingRule, RecordMeta};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

fn row_to_curriculum(row: &SqliteRow) -> Result<Curriculum> {
    Ok(Curriculum {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        year: row.try_get("year")?,
        is_active: row.try_get("is_active")?,
        meta: RecordMeta::from_row(row)?,
    })
}

fn row_to_curriculum_subject(row: &SqliteRow) -> Result<CurriculumSubject> {
    Ok(CurriculumSubject {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        curriculum_id: get_uuid(row, "curriculum_id")?,
        subject_id: get_uuid(row, "subject_id")?,
        grade_level: row.try_get("grade_level")?,
        semester: row.try_get("semester")?,
        meta: RecordMeta::from_row(row)?,
    })
}

fn row_to_rule(row: &SqliteRow) -> Result<GradingRule> {
    Ok(GradingRule {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        curriculum_id: get_uuid(row, "curriculum_id")?,
        grade: row.try_get("grade")?,
        min_score: row.try_get("min_score")?,
        max_score: row.try_get("max_score")?,
        points: row.try_get("points")?,
        description: row.try_get("description")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_curriculum(pool: &SqlitePool, c: &Curriculum) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO curricula (
            id, tenant_id, name, description, year, is_active,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(c.id.to_string())
    .bind(&c.tenant_id)
    .bind(&c.name)
    .bind(&c.description)
    .bind(c.year)
    .bind(c.is_active)
    .bind(c.meta.created_at)
    .bind(c.meta.updated_at)
    .bind(c.meta.created_by.map(|u| u.to_string()))
    .bind(c.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_curriculum(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Curriculum>> {
    let row = scope.by_id("curricula", id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_curriculum).transpose()
}

pub async fn list_curricula(pool: &SqlitePool, scope: &TenantScope) -> Result<Vec<Curriculum>> {
    let mut query = scope.select("curricula");
    query.push(" ORDER BY year DESC, name");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_curriculum).collect()
}

pub async fn insert_curriculum_subject(pool: &SqlitePool, cs: &CurriculumSubject) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO curriculum_subjects (
            id, tenant_id, curriculum_id, subject_id, grade_level, semester,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(cs.id.to_string())
    .bind(&cs.tenant_id)
    .bind(cs.curriculum_id.to_string())
    .bind(cs.subject_id.to_string())
    .bind(cs.grade_level)
    .bind(cs.semester)
    .bind(cs.meta.created_at)
    .bind(cs.meta.updated_at)
    .bind(cs.meta.created_by.map(|u| u.to_string()))
    .bind(cs.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_curriculum_subjects(
    pool: &SqlitePool,
    scope: &TenantScope,
    curriculum_id: Uuid,
) -> Result<Vec<CurriculumSubject>> {
    let mut query = scope.select("curriculum_subjects");
    query
        .push(" AND curriculum_id = ")
        .push_bind(curriculum_id.to_string())
        .push(" ORDER BY grade_level, semester");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_curriculum_subject).collect()
}

pub async fn insert_grading_rule(pool: &SqlitePool, r: &GradingRule) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO grading_rules (
            id, tenant_id, curriculum_id, grade, min_score, max_score, points, description,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(r.id.to_string())
    .bind(&r.tenant_id)
    .bind(r.curriculum_id.to_string())
    .bind(&r.grade)
    .bind(r.min_score)
    .bind(r.max_score)
    .bind(r.points)
    .bind(&r.description)
    .bind(r.meta.created_at)
    .bind(r.meta.updated_at)
    .bind(r.meta.created_by.map(|u| u.to_string()))
    .bind(r.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Rules ordered by `min_score` descending
pub async fn list_grading_rules(pool: &SqlitePool, scope: &TenantScope, curriculum_id: Uuid) -> Result<Vec<GradingRule>> {
    let mut query = scope.select("grading_rules");
    query
        .push(" AND curriculum_id = ")
        .push_bind(curriculum_id.to_string())
        .push(" ORDER BY min_score DESC");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_rule).collect()
}
