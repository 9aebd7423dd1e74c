//! Read-only lookups into tables owned by the academic service

use sisfo_common::db::TenantScope;
use sisfo_common::models::{GradingRule, RecordMeta};
use sisfo_common::uuid_utils::{get_opt_uuid, get_uuid};
use sisfo_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// The parts of a subject a report card line needs
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectInfo {
    pub name: String,
    pub credit_units: i64,
}

pub async fn subject_info(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<SubjectInfo>> {
    let mut query = scope.select_columns("subjects", "name, credit_units");
    query.push(" AND id = ").push_bind(id.to_string());
    let row = query.build().fetch_optional(pool).await?;
    row.map(|r| -> Result<SubjectInfo> {
        Ok(SubjectInfo {
            name: r.try_get("name")?,
            credit_units: r.try_get("credit_units")?,
        })
    })
    .transpose()
}

/// Curriculum bound to a semester; `None` when the semester is unknown or unbound
pub async fn semester_curriculum(pool: &SqlitePool, scope: &TenantScope, semester_id: Uuid) -> Result<Option<Uuid>> {
    let mut query = scope.select_columns("semesters", "curriculum_id");
    query.push(" AND id = ").push_bind(semester_id.to_string());
    let row = query.build().fetch_optional(pool).await?;
    match row {
        Some(r) => get_opt_uuid(&r, "curriculum_id"),
        None => Ok(None),
    }
}

/// Grading rules of a curriculum, highest band first
pub async fn grading_rules(pool: &SqlitePool, scope: &TenantScope, curriculum_id: Uuid) -> Result<Vec<GradingRule>> {
    let mut query = scope.select("grading_rules");
    query
        .push(" AND curriculum_id = ")
        .push_bind(curriculum_id.to_string())
        .push(" ORDER BY min_score DESC");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter()
        .map(|row| -> Result<GradingRule> {
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
        })
        .collect()
}

async fn name_of(pool: &SqlitePool, scope: &TenantScope, table: &str, id: Uuid) -> Result<Option<String>> {
    let mut query = scope.select_columns(table, "name");
    query.push(" AND id = ").push_bind(id.to_string());
    let row = query.build().fetch_optional(pool).await?;
    Ok(row.map(|r| r.try_get("name")).transpose()?)
}

pub async fn student_name(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<String>> {
    name_of(pool, scope, "students", id).await
}

pub async fn class_name(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<String>> {
    name_of(pool, scope, "classes", id).await
}

pub async fn semester_name(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<String>> {
    name_of(pool, scope, "semesters", id).await
}
