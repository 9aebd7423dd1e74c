//! Integration tests for the schedule API
//!
//! Drives the router in-process against the production schema in memory.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

const TENANT: &str = "school-1";

async fn create_test_app() -> Router {
    let pool = sisfo_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    sisfo_academic::build_router(sisfo_academic::AppState::new(pool, Duration::from_secs(5)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, TENANT, method, uri, body).await
}

async fn send_as(app: &Router, tenant: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if !tenant.is_empty() {
        builder = builder.header("X-Tenant-ID", tenant);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn slot(class_id: Uuid, teacher_id: Uuid, day: i64, start: &str, end: &str, room: &str) -> Value {
    json!({
        "class_id": class_id,
        "subject_id": Uuid::new_v4(),
        "teacher_id": teacher_id,
        "day_of_week": day,
        "start_time": start,
        "end_time": end,
        "room": room,
    })
}

#[tokio::test]
async fn test_create_slot_then_conflict_on_overlap() {
    let app = create_test_app().await;
    let class_id = Uuid::new_v4();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(class_id, Uuid::new_v4(), 1, "08:00", "10:00", "R1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["start_time"], "08:00:00");
    let first_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(class_id, Uuid::new_v4(), 1, "09:00", "11:00", "R2")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "SCHEDULE_CONFLICT");
    assert!(body["error"]["message"].as_str().unwrap().contains("conflict"));
    assert_eq!(body["error"]["details"]["conflicts"][0], first_id.as_str());
}

#[tokio::test]
async fn test_adjacent_slots_and_shared_room() {
    let app = create_test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(Uuid::new_v4(), Uuid::new_v4(), 2, "07:00", "08:00", "LAB")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Touching intervals do not overlap
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(Uuid::new_v4(), Uuid::new_v4(), 2, "08:00", "09:00", "LAB")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(Uuid::new_v4(), Uuid::new_v4(), 2, "07:30", "07:45", "LAB")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Empty rooms never clash on their own
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(Uuid::new_v4(), Uuid::new_v4(), 2, "07:30", "07:45", "")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_bulk_create_rolls_back_on_conflict() {
    let app = create_test_app().await;
    let class_id = Uuid::new_v4();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(class_id, Uuid::new_v4(), 2, "09:00", "10:00", "")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let batch = json!({
        "schedules": [
            slot(class_id, Uuid::new_v4(), 1, "07:00", "08:00", ""),
            slot(class_id, Uuid::new_v4(), 2, "09:30", "10:30", ""),
        ]
    });
    let (status, body) = send(&app, "POST", "/api/v1/schedules/bulk", Some(batch)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SCHEDULE_CONFLICT");

    let (status, body) = send(&app, "GET", &format!("/api/v1/schedules/class/{}", class_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_create_commits_clean_batch() {
    let app = create_test_app().await;
    let class_id = Uuid::new_v4();
    let teacher_id = Uuid::new_v4();

    let batch = json!({
        "schedules": [
            slot(class_id, teacher_id, 3, "10:00", "11:00", ""),
            slot(class_id, teacher_id, 1, "07:00", "08:00", ""),
        ]
    });
    let (status, body) = send(&app, "POST", "/api/v1/schedules/bulk", Some(batch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", &format!("/api/v1/schedules/class/{}", class_id), None).await;
    let days: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["day_of_week"].as_i64().unwrap())
        .collect();
    assert_eq!(days, vec![1, 3]);

    let (status, body) = send(&app, "GET", "/api/v1/schedules?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_template_materialisation() {
    let app = create_test_app().await;
    let subject_id = Uuid::new_v4();
    let teacher_id = Uuid::new_v4();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedule-templates",
        Some(json!({
            "name": "Reguler Senin-Selasa",
            "items": [
                { "subject_id": subject_id, "day_of_week": 1, "start_time": "08:00", "end_time": "09:00" },
                { "day_of_week": 2, "start_time": "10:00", "end_time": "11:00" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let template_id = body["data"]["id"].as_str().unwrap().to_string();

    let class_id = Uuid::new_v4();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules/from-template",
        Some(json!({
            "template_id": template_id,
            "class_id": class_id,
            "assignments": { subject_id.to_string(): teacher_id }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created = body["data"].as_array().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["teacher_id"], teacher_id.to_string());
    assert_eq!(created[0]["room"], "");

    let (_, body) = send(&app, "GET", &format!("/api/v1/schedules/class/{}", class_id), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules/from-template",
        Some(json!({
            "template_id": template_id,
            "class_id": Uuid::new_v4(),
            "assignments": {}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_TEACHER_FOR_SUBJECT");
    assert_eq!(body["error"]["details"]["subject_id"], subject_id.to_string());
}

#[tokio::test]
async fn test_template_assignments_as_list() {
    let app = create_test_app().await;
    let subject_id = Uuid::new_v4();

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/schedule-templates",
        Some(json!({
            "name": "Jumat",
            "items": [{ "subject_id": subject_id, "day_of_week": 5, "start_time": "07:00", "end_time": "07:45" }]
        })),
    )
    .await;
    let template_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules/from-template",
        Some(json!({
            "template_id": template_id,
            "class_id": Uuid::new_v4(),
            "assignments": [{ "subject_id": subject_id, "teacher_id": Uuid::new_v4() }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_and_unknown_template() {
    let app = create_test_app().await;

    let (_, body) = send(&app, "POST", "/api/v1/schedule-templates", Some(json!({ "name": "Kosong" }))).await;
    let template_id = body["data"]["id"].as_str().unwrap().to_string();

    let request = |template: String| {
        json!({ "template_id": template, "class_id": Uuid::new_v4(), "assignments": {} })
    };

    let (status, body) = send(&app, "POST", "/api/v1/schedules/from-template", Some(request(template_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "TEMPLATE_EMPTY");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules/from-template",
        Some(request(Uuid::new_v4().to_string())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "4004");
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = create_test_app().await;
    let class_id = Uuid::new_v4();
    let teacher_id = Uuid::new_v4();

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(class_id, teacher_id, 4, "08:00", "09:00", "")),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Shifting a slot over its own old interval is allowed
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/schedules/{}", id),
        Some(slot(class_id, teacher_id, 4, "08:30", "09:30", "")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["start_time"], "08:30:00");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/schedules/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/v1/schedules/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "4004");
}

#[tokio::test]
async fn test_validation_errors() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(Uuid::new_v4(), Uuid::new_v4(), 8, "10:00", "09:00", "")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "4001");
    assert!(body["error"]["details"]["day_of_week"].is_string());
    assert!(body["error"]["details"]["time_range"].is_string());

    let (status, body) = send(&app, "GET", "/api/v1/schedules/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "4001");
}

#[tokio::test]
async fn test_tenant_header_and_isolation() {
    let app = create_test_app().await;

    let (status, body) = send_as(&app, "", "GET", "/api/v1/schedules", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "4001");

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/schedules",
        Some(slot(Uuid::new_v4(), Uuid::new_v4(), 1, "08:00", "09:00", "")),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send_as(&app, "school-2", "GET", &format!("/api/v1/schedules/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;
    let (status, body) = send_as(&app, "", "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "sisfo-academic");
}
