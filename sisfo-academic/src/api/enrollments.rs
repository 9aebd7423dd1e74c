//! Enrollment endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::Enrollment;

use crate::services::enrollments::{EnrollInput, StatusInput};
use crate::AppState;

pub async fn enroll(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<EnrollInput>,
) -> ApiResult<Enrollment> {
    let enrollment = state
        .call(state.enrollments.enroll(&tenant.id, tenant.actor, input.class_id, input.student_id))
        .await?;
    Ok(success(enrollment))
}

pub async fn get_enrollment(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Enrollment> {
    let id = parse_id(&id)?;
    let enrollment = state
        .call(state.enrollments.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("enrollment {} not found", id)))?;
    Ok(success(enrollment))
}

pub async fn update_status(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StatusInput>,
) -> ApiResult<Enrollment> {
    let id = parse_id(&id)?;
    let enrollment = state
        .call(state.enrollments.update_status(&tenant.id, tenant.actor, id, input.status))
        .await?;
    Ok(success(enrollment))
}

pub async fn unenroll(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.call(state.enrollments.unenroll(&tenant.id, id)).await?;
    Ok(success(json!({ "id": id, "deleted": true })))
}

pub async fn list_by_student(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(student_id): Path<String>,
) -> ApiResult<Vec<Enrollment>> {
    let student_id = parse_id(&student_id)?;
    let enrollments = state
        .call(state.enrollments.list_by_student(&tenant.id, student_id))
        .await?;
    Ok(success(enrollments))
}

/// Build enrollment routes
pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/enrollments", post(enroll))
        .route("/enrollments/:id", get(get_enrollment).delete(unenroll))
        .route("/enrollments/:id/status", put(update_status))
        .route("/enrollments/students/:student_id", get(list_by_student))
}
