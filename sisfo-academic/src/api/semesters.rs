//! Semester endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiQuery, ApiResult, Tenant};
use sisfo_common::models::Semester;
use uuid::Uuid;

use crate::services::semesters::SemesterInput;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SemesterFilter {
    pub academic_year_id: Option<Uuid>,
}

pub async fn create_semester(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<SemesterInput>,
) -> ApiResult<Semester> {
    let semester = state.call(state.semesters.create(&tenant.id, tenant.actor, input)).await?;
    Ok(success(semester))
}

/// GET /semesters?academic_year_id=
pub async fn list_semesters(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(filter): ApiQuery<SemesterFilter>,
) -> ApiResult<Vec<Semester>> {
    let semesters = state
        .call(state.semesters.list(&tenant.id, filter.academic_year_id))
        .await?;
    Ok(success(semesters))
}

pub async fn get_semester(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Semester> {
    let id = parse_id(&id)?;
    let semester = state
        .call(state.semesters.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("semester {} not found", id)))?;
    Ok(success(semester))
}

pub async fn update_semester(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SemesterInput>,
) -> ApiResult<Semester> {
    let id = parse_id(&id)?;
    let semester = state
        .call(state.semesters.update(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(semester))
}

pub async fn activate_semester(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Semester> {
    let id = parse_id(&id)?;
    let semester = state.call(state.semesters.set_active(&tenant.id, tenant.actor, id)).await?;
    Ok(success(semester))
}

pub async fn delete_semester(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.call(state.semesters.delete(&tenant.id, id)).await?;
    Ok(success(json!({ "id": id, "deleted": true })))
}

/// Build semester routes
pub fn semester_routes() -> Router<AppState> {
    Router::new()
        .route("/semesters", post(create_semester).get(list_semesters))
        .route(
            "/semesters/:id",
            get(get_semester).put(update_semester).delete(delete_semester),
        )
        .route("/semesters/:id/activate", post(activate_semester))
}
