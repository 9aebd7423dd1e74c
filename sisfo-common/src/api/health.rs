//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Health check response: status, module name and version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// `GET /health` and `GET /api/v1/health` (not enveloped)
pub fn health_routes<S>(module: &'static str, version: &'static str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let handler = move || async move {
        Json(HealthResponse {
            status: "ok".to_string(),
            module: module.to_string(),
            version: version.to_string(),
        })
    };

    Router::new()
        .route("/health", get(handler))
        .route("/api/v1/health", get(handler))
}
