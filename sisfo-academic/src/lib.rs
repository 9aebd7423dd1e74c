//! sisfo-academic library - academic service
//!
//! Schedules with conflict checking, schedule templates, semesters,
//! enrollments, class subjects, curricula and the reference data they use.
//! Students registered by admission arrive through [`events`].

use axum::Router;
use sisfo_common::deadline::with_deadline;
use sisfo_common::Result;
use sqlx::SqlitePool;
use std::future::Future;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod events;
pub mod services;

use services::{
    ClassSubjectService, CurriculumService, EnrollmentService, ReferenceService, ScheduleService,
    ScheduleTemplateService, SemesterService, StudentService,
};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 9092;

/// Module name reported by the health endpoint
pub const MODULE_NAME: &str = "sisfo-academic";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Upper bound for every engine call made by a handler
    pub call_timeout: Duration,
    pub schedules: ScheduleService,
    pub templates: ScheduleTemplateService,
    pub semesters: SemesterService,
    pub enrollments: EnrollmentService,
    pub class_subjects: ClassSubjectService,
    pub curricula: CurriculumService,
    pub reference: ReferenceService,
    pub students: StudentService,
}

impl AppState {
    pub fn new(db: SqlitePool, call_timeout: Duration) -> Self {
        Self {
            schedules: ScheduleService::new(db.clone()),
            templates: ScheduleTemplateService::new(db.clone()),
            semesters: SemesterService::new(db.clone()),
            enrollments: EnrollmentService::new(db.clone()),
            class_subjects: ClassSubjectService::new(db.clone()),
            curricula: CurriculumService::new(db.clone()),
            reference: ReferenceService::new(db.clone()),
            students: StudentService::new(db.clone()),
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
        .merge(api::schedule_routes())
        .merge(api::template_routes())
        .merge(api::semester_routes())
        .merge(api::class_routes())
        .merge(api::enrollment_routes())
        .merge(api::curriculum_routes())
        .merge(api::reference_routes())
        .merge(api::student_routes());

    Router::new()
        .nest("/api/v1", v1)
        .merge(sisfo_common::api::health_routes(MODULE_NAME, env!("CARGO_PKG_VERSION")))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
