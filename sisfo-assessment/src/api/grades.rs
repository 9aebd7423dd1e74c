//! Grade endpoints
//!
//! Grade input is an upsert keyed on (student, assessment). Final scores are
//! computed on request and never stored.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiQuery, ApiResult, Tenant};
use sisfo_common::models::Grade;
use uuid::Uuid;

use crate::services::grading::{FinalScore, GradeInput};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StudentGradeFilter {
    pub class_id: Option<Uuid>,
    pub semester_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct FinalScoreQuery {
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub semester_id: Option<Uuid>,
}

pub async fn input_grade(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<GradeInput>,
) -> ApiResult<Grade> {
    let grade = state.call(state.grading.input_grade(&tenant.id, tenant.actor, input)).await?;
    Ok(success(grade))
}

pub async fn get_grade(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Grade> {
    let id = parse_id(&id)?;
    let grade = state
        .call(state.grading.get_grade(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("grade {} not found", id)))?;
    Ok(success(grade))
}

pub async fn approve_grade(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Grade> {
    let id = parse_id(&id)?;
    let grade = state.call(state.grading.approve_grade(&tenant.id, tenant.actor, id)).await?;
    Ok(success(grade))
}

/// GET /grades/students/:student_id?class_id=&semester_id=
pub async fn list_student_grades(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(student_id): Path<String>,
    ApiQuery(filter): ApiQuery<StudentGradeFilter>,
) -> ApiResult<Vec<Grade>> {
    let student_id = parse_id(&student_id)?;
    let grades = state
        .call(
            state
                .grading
                .list_student_grades(&tenant.id, student_id, filter.class_id, filter.semester_id),
        )
        .await?;
    Ok(success(grades))
}

/// GET /grades/students/:student_id/final-score?class_id=&subject_id=&semester_id=
pub async fn final_score(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(student_id): Path<String>,
    ApiQuery(query): ApiQuery<FinalScoreQuery>,
) -> ApiResult<FinalScore> {
    let student_id = parse_id(&student_id)?;
    let score = state
        .call(state.grading.final_score(
            &tenant.id,
            student_id,
            query.class_id,
            query.subject_id,
            query.semester_id,
        ))
        .await?;
    Ok(success(score))
}

/// Build grade routes
pub fn grade_routes() -> Router<AppState> {
    Router::new()
        .route("/grades", post(input_grade))
        .route("/grades/:id", get(get_grade))
        .route("/grades/:id/approve", post(approve_grade))
        .route("/grades/students/:student_id", get(list_student_grades))
        .route("/grades/students/:student_id/final-score", get(final_score))
}
