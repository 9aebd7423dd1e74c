//! HTTP framing shared by every SISFO service
//!
//! Handlers return [`ApiResult`]; this module is the only place where
//! domain errors become HTTP statuses.

pub mod envelope;
pub mod error;
pub mod extract;
pub mod health;

pub use envelope::{success, Envelope, ErrorBody, Meta};
pub use error::{ApiError, ApiResult};
pub use extract::{parse_id, ApiJson, ApiQuery, Tenant, TENANT_HEADER, USER_HEADER};
pub use health::{health_routes, HealthResponse};
