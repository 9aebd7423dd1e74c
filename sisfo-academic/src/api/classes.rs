//! Class endpoints, including subject assignment and class rosters

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use sisfo_common::api::{parse_id, success, ApiError, ApiJson, ApiResult, Tenant};
use sisfo_common::models::{Class, ClassSubject, Enrollment};

use crate::services::class_subjects::{AssignSubjectInput, AssignTeacherInput};
use crate::services::enrollments::BulkEnrollInput;
use crate::services::reference::ClassInput;
use crate::AppState;

pub async fn create_class(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<ClassInput>,
) -> ApiResult<Class> {
    let class = state.call(state.reference.create_class(&tenant.id, tenant.actor, input)).await?;
    Ok(success(class))
}

pub async fn list_classes(State(state): State<AppState>, tenant: Tenant) -> ApiResult<Vec<Class>> {
    let classes = state.call(state.reference.list_classes(&tenant.id)).await?;
    Ok(success(classes))
}

pub async fn get_class(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Class> {
    let id = parse_id(&id)?;
    let class = state
        .call(state.reference.get_class(&tenant.id, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("class {} not found", id)))?;
    Ok(success(class))
}

pub async fn assign_subject(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AssignSubjectInput>,
) -> ApiResult<ClassSubject> {
    let class_id = parse_id(&id)?;
    let assignment = state
        .call(state.class_subjects.assign(&tenant.id, tenant.actor, class_id, input))
        .await?;
    Ok(success(assignment))
}

pub async fn list_subjects(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Vec<ClassSubject>> {
    let class_id = parse_id(&id)?;
    let subjects = state.call(state.class_subjects.list(&tenant.id, class_id)).await?;
    Ok(success(subjects))
}

pub async fn remove_subject(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((id, subject_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let class_id = parse_id(&id)?;
    let subject_id = parse_id(&subject_id)?;
    state
        .call(state.class_subjects.remove(&tenant.id, class_id, subject_id))
        .await?;
    Ok(success(json!({ "class_id": class_id, "subject_id": subject_id, "deleted": true })))
}

/// PUT /classes/:id/subjects/:subject_id/teacher
pub async fn assign_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((id, subject_id)): Path<(String, String)>,
    ApiJson(input): ApiJson<AssignTeacherInput>,
) -> ApiResult<ClassSubject> {
    let class_id = parse_id(&id)?;
    let subject_id = parse_id(&subject_id)?;
    let assignment = state
        .call(state.class_subjects.assign_teacher(
            &tenant.id,
            tenant.actor,
            class_id,
            subject_id,
            input.teacher_id,
        ))
        .await?;
    Ok(success(assignment))
}

pub async fn list_students(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> ApiResult<Vec<Enrollment>> {
    let class_id = parse_id(&id)?;
    let enrollments = state.call(state.enrollments.list_by_class(&tenant.id, class_id)).await?;
    Ok(success(enrollments))
}

/// POST /classes/:id/students/bulk
pub async fn bulk_enroll(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BulkEnrollInput>,
) -> ApiResult<Vec<Enrollment>> {
    let class_id = parse_id(&id)?;
    let enrollments = state
        .call(state.enrollments.bulk_enroll(&tenant.id, tenant.actor, class_id, input.student_ids))
        .await?;
    Ok(success(enrollments))
}

/// Build class routes
pub fn class_routes() -> Router<AppState> {
    Router::new()
        .route("/classes", post(create_class).get(list_classes))
        .route("/classes/:id", get(get_class))
        .route("/classes/:id/subjects", post(assign_subject).get(list_subjects))
        .route("/classes/:id/subjects/:subject_id", delete(remove_subject))
        .route("/classes/:id/subjects/:subject_id/teacher", put(assign_teacher))
        .route("/classes/:id/students", get(list_students))
        .route("/classes/:id/students/bulk", post(bulk_enroll))
}
