//! Student endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiQuery, ApiResult, Tenant};
use sisfo_common::models::Student;
use sisfo_common::pagination::{Page, PageParams};

use crate::services::students::StudentInput;
use crate::AppState;

pub async fn create_student(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<StudentInput>,
) -> ApiResult<Student> {
    let student = state.call(state.students.create(&tenant.id, tenant.actor, input)).await?;
    Ok(success(student))
}

pub async fn list_students(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<Student>> {
    let page = state.call(state.students.list(&tenant.id, params.resolve())).await?;
    Ok(success(page))
}

pub async fn get_student(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Student> {
    let id = parse_id(&id)?;
    let student = state
        .call(state.students.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("student {} not found", id)))?;
    Ok(success(student))
}

/// Build student routes
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/students", post(create_student).get(list_students))
        .route("/students/:id", get(get_student))
}
