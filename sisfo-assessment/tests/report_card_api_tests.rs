//! Integration tests for report card generation and publishing

use axum::{
    body::{Body, Bytes},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sisfo_assessment::services::storage::LocalStorage;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

const TENANT: &str = "school-1";

async fn create_test_app(dir: &tempfile::TempDir) -> Router {
    let pool = sisfo_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let storage = Arc::new(LocalStorage::new(dir.path(), "http://localhost/files"));
    sisfo_assessment::build_router(sisfo_assessment::AppState::new(pool, Duration::from_secs(5), storage))
}

async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Bytes) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Tenant-ID", TENANT);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, bytes)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

struct Term {
    student: Uuid,
    class_id: Uuid,
    semester_id: Uuid,
}

/// One graded assessment for a fresh student, class and semester
async fn graded_term(app: &Router, score: f64) -> Term {
    let term = Term {
        student: Uuid::new_v4(),
        class_id: Uuid::new_v4(),
        semester_id: Uuid::new_v4(),
    };

    let (_, body) = send(
        app,
        "POST",
        "/api/v1/grade-categories",
        Some(json!({ "name": "Ujian", "weight": 1 })),
    )
    .await;
    let category = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        app,
        "POST",
        "/api/v1/assessments",
        Some(json!({
            "grade_category_id": category,
            "teacher_id": Uuid::new_v4(),
            "subject_id": Uuid::new_v4(),
            "class_id": term.class_id,
            "semester_id": term.semester_id,
            "name": "UAS",
            "max_score": 100,
            "date": "2024-12-02",
        })),
    )
    .await;
    let assessment = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        "POST",
        "/api/v1/grades",
        Some(json!({ "assessment_id": assessment, "student_id": term.student, "score": score })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    term
}

fn generate_body(term: &Term) -> Value {
    json!({
        "student_id": term.student,
        "class_id": term.class_id,
        "semester_id": term.semester_id,
        "attendance_summary": { "present": 110, "absent": 2 },
    })
}

#[tokio::test]
async fn test_generate_publish_then_frozen() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(&dir).await;
    let term = graded_term(&app, 86.0).await;

    let (status, body) = send(&app, "POST", "/api/v1/report-cards/generate", Some(generate_body(&term))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "generated");
    assert_eq!(body["data"]["details"][0]["grade_letter"], "B");
    assert_eq!(body["data"]["attendance_summary"]["present"], 110);
    let pdf_url = body["data"]["pdf_url"].as_str().unwrap();
    assert!(!pdf_url.is_empty());
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(dir
        .path()
        .join(format!("report_cards/{}/{}.pdf", TENANT, id))
        .exists());

    let (status, body) = send(&app, "POST", &format!("/api/v1/report-cards/{}/publish", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "published");
    let (_, before) = send(&app, "GET", &format!("/api/v1/report-cards/{}", id), None).await;

    let (status, body) = send(&app, "POST", "/api/v1/report-cards/generate", Some(generate_body(&term))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_PUBLISHED");
    assert_eq!(body["error"]["message"], "report card already published");

    let (_, after) = send(&app, "GET", &format!("/api/v1/report-cards/{}", id), None).await;
    assert_eq!(before["data"], after["data"]);
}

#[tokio::test]
async fn test_grades_frozen_after_publish() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(&dir).await;
    let term = graded_term(&app, 70.0).await;

    let (_, body) = send(&app, "POST", "/api/v1/report-cards/generate", Some(generate_body(&term))).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    send(&app, "POST", &format!("/api/v1/report-cards/{}/publish", id), None).await;

    let (_, grades) = send(&app, "GET", &format!("/api/v1/grades/students/{}", term.student), None).await;
    let assessment = grades["data"][0]["assessment_id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/grades",
        Some(json!({ "assessment_id": assessment, "student_id": term.student, "score": 99 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_PUBLISHED");
}

#[tokio::test]
async fn test_pdf_download() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(&dir).await;
    let term = graded_term(&app, 91.0).await;

    let (_, body) = send(&app, "POST", "/api/v1/report-cards/generate", Some(generate_body(&term))).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, content_type, bytes) = send_raw(&app, "GET", &format!("/api/v1/report-cards/{}/pdf", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert!(bytes.starts_with(b"%PDF"));

    let (status, body) = send(&app, "GET", &format!("/api/v1/report-cards/{}/pdf", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "4004");
}

#[tokio::test]
async fn test_list_by_student_and_unknown_card() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(&dir).await;
    let term = graded_term(&app, 65.0).await;
    send(&app, "POST", "/api/v1/report-cards/generate", Some(generate_body(&term))).await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/report-cards/students/{}", term.student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!(
        "/api/v1/report-cards/students/{}?semester_id={}",
        term.student,
        Uuid::new_v4()
    );
    let (_, body) = send(&app, "GET", &uri, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "POST", &format!("/api/v1/report-cards/{}/publish", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_template_crud_and_branded_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(&dir).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/templates",
        Some(json!({
            "name": "Resmi",
            "config": {
                "header_text": "SMA Negeri 3 Semarang",
                "footer_text": "Wali Kelas",
                "primary_color": "#1A5276",
            },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["is_default"], true);
    assert_eq!(body["data"]["config"]["logo_url"], "");
    let first = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/templates",
        Some(json!({ "name": "Warna", "config": { "primary_color": "biru" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "4001");

    let term = graded_term(&app, 83.0).await;
    let (_, body) = send(&app, "POST", "/api/v1/report-cards/generate", Some(generate_body(&term))).await;
    let card = body["data"]["id"].as_str().unwrap().to_string();
    let (_, _, bytes) = send_raw(&app, "GET", &format!("/api/v1/report-cards/{}/pdf", card), None).await;
    let pdf = String::from_utf8_lossy(&bytes);
    assert!(pdf.contains("(SMA Negeri 3 Semarang) Tj"));
    assert!(pdf.contains("(Wali Kelas) Tj"));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/templates/{}", first),
        Some(json!({ "name": "Resmi", "config": { "header_text": "SMA Negeri 3" }, "is_default": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["config"]["footer_text"], "");

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/templates/{}", first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);
    let (_, body) = send(&app, "GET", "/api/v1/templates", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (status, _) = send(&app, "GET", &format!("/api/v1/templates/{}", first), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Without a template the card carries no branding
    let (_, _, bytes) = send_raw(&app, "GET", &format!("/api/v1/report-cards/{}/pdf", card), None).await;
    assert!(!String::from_utf8_lossy(&bytes).contains("SMA Negeri 3"));
}
