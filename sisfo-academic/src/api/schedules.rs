//! Schedule endpoints
//!
//! POST   /schedules
//! GET    /schedules?limit=&offset=
//! POST   /schedules/bulk
//! POST   /schedules/from-template
//! GET    /schedules/class/:class_id
//! GET    /schedules/:id
//! PUT    /schedules/:id
//! DELETE /schedules/:id

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiQuery, ApiResult, Tenant};
use sisfo_common::models::Schedule;
use sisfo_common::pagination::{Page, PageParams};
use uuid::Uuid;

use crate::services::schedule_engine::{ScheduleInput, TeacherAssignments};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkScheduleRequest {
    pub schedules: Vec<ScheduleInput>,
}

#[derive(Debug, Deserialize)]
pub struct FromTemplateRequest {
    pub template_id: Uuid,
    pub class_id: Uuid,
    #[serde(default)]
    pub assignments: TeacherAssignments,
}

pub async fn create_schedule(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<ScheduleInput>,
) -> ApiResult<Schedule> {
    let schedule = state
        .call(state.schedules.create(&tenant.id, tenant.actor, input))
        .await?;
    Ok(success(schedule))
}

pub async fn list_schedules(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<Schedule>> {
    let page = state.call(state.schedules.list(&tenant.id, params.resolve())).await?;
    Ok(success(page))
}

pub async fn bulk_create_schedules(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(request): ApiJson<BulkScheduleRequest>,
) -> ApiResult<Vec<Schedule>> {
    let created = state
        .call(state.schedules.bulk_create(&tenant.id, tenant.actor, request.schedules))
        .await?;
    Ok(success(created))
}

pub async fn create_from_template(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(request): ApiJson<FromTemplateRequest>,
) -> ApiResult<Vec<Schedule>> {
    let assignments = request.assignments.into_map();
    let created = state
        .call(state.schedules.create_from_template(
            &tenant.id,
            tenant.actor,
            request.template_id,
            request.class_id,
            &assignments,
        ))
        .await?;
    Ok(success(created))
}

pub async fn list_by_class(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(class_id): Path<String>,
) -> ApiResult<Vec<Schedule>> {
    let class_id = parse_id(&class_id)?;
    let schedules = state.call(state.schedules.list_by_class(&tenant.id, class_id)).await?;
    Ok(success(schedules))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Schedule> {
    let id = parse_id(&id)?;
    let schedule = state
        .call(state.schedules.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("schedule {} not found", id)))?;
    Ok(success(schedule))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ScheduleInput>,
) -> ApiResult<Schedule> {
    let id = parse_id(&id)?;
    let schedule = state
        .call(state.schedules.update(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(schedule))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.call(state.schedules.delete(&tenant.id, id)).await?;
    Ok(success(json!({ "id": id, "deleted": true })))
}

/// Build schedule routes
pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/schedules", post(create_schedule).get(list_schedules))
        .route("/schedules/bulk", post(bulk_create_schedules))
        .route("/schedules/from-template", post(create_from_template))
        .route("/schedules/class/:class_id", get(list_by_class))
        .route(
            "/schedules/:id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}
