//! Grade category endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::GradeCategory;

use crate::services::categories::GradeCategoryInput;
use crate::AppState;

pub async fn create_category(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<GradeCategoryInput>,
) -> ApiResult<GradeCategory> {
    let category = state.call(state.categories.create(&tenant.id, tenant.actor, input)).await?;
    Ok(success(category))
}

pub async fn list_categories(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<GradeCategory>> {
    let categories = state.call(state.categories.list(&tenant.id)).await?;
    Ok(success(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<GradeCategory> {
    let id = parse_id(&id)?;
    let category = state
        .call(state.categories.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("grade category {} not found", id)))?;
    Ok(success(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<GradeCategoryInput>,
) -> ApiResult<GradeCategory> {
    let id = parse_id(&id)?;
    let category = state
        .call(state.categories.update(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.call(state.categories.delete(&tenant.id, id)).await?;
    Ok(success(json!({ "id": id, "deleted": true })))
}

/// Build grade category routes
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/grade-categories", post(create_category).get(list_categories))
        .route(
            "/grade-categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}
