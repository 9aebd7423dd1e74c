//! Curriculum endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::{Curriculum, CurriculumSubject, GradingRule};

use crate::services::curricula::{CurriculumInput, CurriculumSubjectInput, GradingRuleInput};
use crate::AppState;

pub async fn create_curriculum(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<CurriculumInput>,
) -> ApiResult<Curriculum> {
    let curriculum = state.call(state.curricula.create(&tenant.id, tenant.actor, input)).await?;
    Ok(success(curriculum))
}

pub async fn list_curricula(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<Curriculum>> {
    let curricula = state.call(state.curricula.list(&tenant.id)).await?;
    Ok(success(curricula))
}

pub async fn get_curriculum(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Curriculum> {
    let id = parse_id(&id)?;
    let curriculum = state
        .call(state.curricula.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("curriculum {} not found", id)))?;
    Ok(success(curriculum))
}

pub async fn add_subject(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CurriculumSubjectInput>,
) -> ApiResult<CurriculumSubject> {
    let id = parse_id(&id)?;
    let subject = state
        .call(state.curricula.add_subject(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(subject))
}

pub async fn list_subjects(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Vec<CurriculumSubject>> {
    let id = parse_id(&id)?;
    let subjects = state.call(state.curricula.list_subjects(&tenant.id, id)).await?;
    Ok(success(subjects))
}

pub async fn add_grading_rule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<GradingRuleInput>,
) -> ApiResult<GradingRule> {
    let id = parse_id(&id)?;
    let rule = state
        .call(state.curricula.add_grading_rule(&tenant.id, tenant.actor, id, input))
        .await?;
    Ok(success(rule))
}

/// GET /curricula/:id/grading-rules (highest band first)
pub async fn list_grading_rules(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Vec<GradingRule>> {
    let id = parse_id(&id)?;
    let rules = state.call(state.curricula.list_grading_rules(&tenant.id, id)).await?;
    Ok(success(rules))
}

/// Build curriculum routes
pub fn curriculum_routes() -> Router<AppState> {
    Router::new()
        .route("/curricula", post(create_curriculum).get(list_curricula))
        .route("/curricula/:id", get(get_curriculum))
        .route("/curricula/:id/subjects", post(add_subject).get(list_subjects))
        .route("/curricula/:id/grading-rules", post(add_grading_rule).get(list_grading_rules))
}
