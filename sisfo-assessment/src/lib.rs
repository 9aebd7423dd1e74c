//! sisfo-assessment library - assessment service
//!
//! Grade categories, assessments and grades, the weighted final score built
//! from them, and report cards rendered to PDF under the tenant's template
//! and published.

use axum::Router;
use sisfo_common::deadline::with_deadline;
use sisfo_common::Result;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod services;

use services::storage::FileStorage;
use services::{GradeCategoryService, GradingService, ReportCardService, TemplateService};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 9093;

/// Module name reported by the health endpoint
pub const MODULE_NAME: &str = "sisfo-assessment";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub call_timeout: Duration,
    pub categories: GradeCategoryService,
    pub grading: GradingService,
    pub report_cards: ReportCardService,
    pub templates: TemplateService,
}

impl AppState {
    pub fn new(db: SqlitePool, call_timeout: Duration, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            categories: GradeCategoryService::new(db.clone()),
            grading: GradingService::new(db.clone()),
            report_cards: ReportCardService::new(db.clone(), storage),
            templates: TemplateService::new(db.clone()),
            db,
            call_timeout,
        }
    }

    /// Run an engine call under the per-call deadline
    pub async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_deadline(self.call_timeout, fut).await
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(api::category_routes())
        .merge(api::assessment_routes())
        .merge(api::grade_routes())
        .merge(api::report_card_routes())
        .merge(api::template_routes());

    Router::new()
        .nest("/api/v1", v1)
        .merge(sisfo_common::api::health_routes(MODULE_NAME, env!("CARGO_PKG_VERSION")))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
