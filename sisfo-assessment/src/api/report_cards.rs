//! Report card endpoints

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiQuery, ApiResult, Tenant};
use sisfo_common::models::ReportCard;
use uuid::Uuid;

use crate::services::report_cards::GenerateInput;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportCardFilter {
    pub semester_id: Option<Uuid>,
}

pub async fn generate_report_card(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<GenerateInput>,
) -> ApiResult<ReportCard> {
    let card = state
        .call(state.report_cards.generate(&tenant.id, tenant.actor, input))
        .await?;
    Ok(success(card))
}

pub async fn get_report_card(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<ReportCard> {
    let id = parse_id(&id)?;
    let card = state
        .call(state.report_cards.get(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("report card {} not found", id)))?;
    Ok(success(card))
}

/// GET /report-cards/:id/pdf - raw PDF rather than an envelope
pub async fn download_pdf(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let bytes = state
        .call(state.report_cards.render_pdf(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("report card {} not found", id)))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"report_card_{}.pdf\"", id),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub async fn publish_report_card(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<ReportCard> {
    let id = parse_id(&id)?;
    let card = state.call(state.report_cards.publish(&tenant.id, tenant.actor, id)).await?;
    Ok(success(card))
}

/// GET /report-cards/students/:student_id?semester_id=
pub async fn list_student_report_cards(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(student_id): Path<String>,
    ApiQuery(filter): ApiQuery<ReportCardFilter>,
) -> ApiResult<Vec<ReportCard>> {
    let student_id = parse_id(&student_id)?;
    let cards = state
        .call(state.report_cards.list_by_student(&tenant.id, student_id, filter.semester_id))
        .await?;
    Ok(success(cards))
}

/// Build report card routes
pub fn report_card_routes() -> Router<AppState> {
    Router::new()
        .route("/report-cards/generate", post(generate_report_card))
        .route("/report-cards/students/:student_id", get(list_student_report_cards))
        .route("/report-cards/:id", get(get_report_card))
        .route("/report-cards/:id/pdf", get(download_pdf))
        .route("/report-cards/:id/publish", post(publish_report_card))
}
