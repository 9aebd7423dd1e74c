//! Schedule template endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::{ScheduleTemplate, ScheduleTemplateItem};

use crate::services::schedule_templates::{TemplateInput, TemplateItemInput};
use crate::AppState;

pub async fn create_template(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<TemplateInput>,
) -> ApiResult<ScheduleTemplate> {
    let template = state.call(state.templates.create(&tenant.id, tenant.actor, input)).await?;
    Ok(success(template))
}

pub async fn list_templates(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<ScheduleTemplate>> {
    let templates = state.call(state.templates.list(&tenant.id)).await?;
    Ok(success(templates))
}

/// GET /schedule-templates/:id (with items)
pub async fn get_template(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<ScheduleTemplate> {
    let id = parse_id(&id)?;
    let template = state
        .call(state.templates.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("schedule template {} not found", id)))?;
    Ok(success(template))
}

pub async fn update_template(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> ApiResult<ScheduleTemplate> {
    let id = parse_id(&id)?;
    let template = state
        .call(state.templates.update(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.call(state.templates.delete(&tenant.id, id)).await?;
    Ok(success(json!({ "id": id, "deleted": true })))
}

pub async fn add_item(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TemplateItemInput>,
) -> ApiResult<ScheduleTemplateItem> {
    let id = parse_id(&id)?;
    let item = state
        .call(state.templates.add_item(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(item))
}

pub async fn remove_item(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(item_id): Path<String>,
) -> ApiResult<Value> {
    let item_id = parse_id(&item_id)?;
    state.call(state.templates.remove_item(&tenant.id, item_id)).await?;
    Ok(success(json!({ "id": item_id, "deleted": true })))
}

/// Build schedule template routes
pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/schedule-templates", post(create_template).get(list_templates))
        .route(
            "/schedule-templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/schedule-templates/:id/items", post(add_item))
        .route("/schedule-templates/items/:item_id", delete(remove_item))
}
