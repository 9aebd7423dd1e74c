//! Assessment endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiQuery, ApiResult, Tenant};
use sisfo_common::models::Assessment;
use uuid::Uuid;

use crate::services::grading::AssessmentInput;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AssessmentFilter {
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
}

pub async fn create_assessment(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<AssessmentInput>,
) -> ApiResult<Assessment> {
    let assessment = state
        .call(state.grading.create_assessment(&tenant.id, tenant.actor, input))
        .await?;
    Ok(success(assessment))
}

/// GET /assessments?class_id=&subject_id=
pub async fn list_assessments(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(filter): ApiQuery<AssessmentFilter>,
) -> ApiResult<Vec<Assessment>> {
    let assessments = state
        .call(state.grading.list_assessments(&tenant.id, filter.class_id, filter.subject_id))
        .await?;
    Ok(success(assessments))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Assessment> {
    let id = parse_id(&id)?;
    let assessment = state
        .call(state.grading.get_assessment(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("assessment {} not found", id)))?;
    Ok(success(assessment))
}

/// Build assessment routes
pub fn assessment_routes() -> Router<AppState> {
    Router::new()
        .route("/assessments", post(create_assessment).get(list_assessments))
        .route("/assessments/:id", get(get_assessment))
}
