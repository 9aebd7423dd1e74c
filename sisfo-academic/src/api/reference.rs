//! Academic year, subject and teacher endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::{AcademicYear, Subject, Teacher};

use crate::services::reference::{AcademicYearInput, SubjectInput, TeacherInput};
use crate::AppState;

pub async fn create_academic_year(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<AcademicYearInput>,
) -> ApiResult<AcademicYear> {
    let year = state
        .call(state.reference.create_academic_year(&tenant.id, tenant.actor, input))
        .await?;
    Ok(success(year))
}

pub async fn list_academic_years(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<AcademicYear>> {
    let years = state.call(state.reference.list_academic_years(&tenant.id)).await?;
    Ok(success(years))
}

pub async fn get_academic_year(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<AcademicYear> {
    let id = parse_id(&id)?;
    let year = state
        .call(state.reference.get_academic_year(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("academic year {} not found", id)))?;
    Ok(success(year))
}

pub async fn create_subject(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<SubjectInput>,
) -> ApiResult<Subject> {
    let subject = state.call(state.reference.create_subject(&tenant.id, tenant.actor, input)).await?;
    Ok(success(subject))
}

pub async fn list_subjects(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<Subject>> {
    let subjects = state.call(state.reference.list_subjects(&tenant.id)).await?;
    Ok(success(subjects))
}

pub async fn get_subject(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Subject> {
    let id = parse_id(&id)?;
    let subject = state
        .call(state.reference.get_subject(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("subject {} not found", id)))?;
    Ok(success(subject))
}

pub async fn create_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<TeacherInput>,
) -> ApiResult<Teacher> {
    let teacher = state.call(state.reference.create_teacher(&tenant.id, tenant.actor, input)).await?;
    Ok(success(teacher))
}

pub async fn list_teachers(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<Teacher>> {
    let teachers = state.call(state.reference.list_teachers(&tenant.id)).await?;
    Ok(success(teachers))
}

pub async fn get_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Teacher> {
    let id = parse_id(&id)?;
    let teacher = state
        .call(state.reference.get_teacher(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("teacher {} not found", id)))?;
    Ok(success(teacher))
}

/// Build reference data routes
pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/academic-years", post(create_academic_year).get(list_academic_years))
        .route("/academic-years/:id", get(get_academic_year))
        .route("/subjects", post(create_subject).get(list_subjects))
        .route("/subjects/:id", get(get_subject))
        .route("/teachers", post(create_teacher).get(list_teachers))
        .route("/teachers/:id", get(get_teacher))
}
