//! Stable JSON envelope
//!
//! Success: `{success: true, data, meta}`.
//! Failure: `{success: false, error: {code, message, details}, meta}`.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: crate::time::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub meta: Meta,
}

impl Envelope<()> {
    pub fn failure(code: &str, message: String, details: Value) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message,
                details,
            }),
            meta: Meta::now(),
        }
    }
}

/// Wrap a payload in a success envelope
pub fn success<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        error: None,
        meta: Meta::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let Json(envelope) = success(serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["id"], 1);
        assert!(value.get("error").is_none());
        assert!(value["meta"]["request_id"].is_string());
    }

    #[test]
    fn test_failure_shape() {
        let envelope = Envelope::failure("4004", "Not found: schedule".into(), Value::Null);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "4004");
        assert!(value.get("data").is_none());
        assert!(value["error"].get("details").is_none());
    }
}
