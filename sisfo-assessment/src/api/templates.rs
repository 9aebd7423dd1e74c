//! Report card template endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::ReportCardTemplate;

use crate::services::templates::TemplateInput;
use crate::AppState;

pub async fn create_template(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<TemplateInput>,
) -> ApiResult<ReportCardTemplate> {
    let template = state.call(state.templates.create(&tenant.id, tenant.actor, input)).await?;
    Ok(success(template))
}

pub async fn list_templates(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<ReportCardTemplate>> {
    Ok(success(state.call(state.templates.list(&tenant.id)).await?))
}

pub async fn get_template(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<ReportCardTemplate> {
    let id = parse_id(&id)?;
    let template = state
        .call(state.templates.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("template {} not found", id)))?;
    Ok(success(template))
}

pub async fn update_template(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> ApiResult<ReportCardTemplate> {
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

/// Build report card template routes
pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", post(create_template).get(list_templates))
        .route(
            "/templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
}
