//! Request extractors that reject with the 400 envelope

use super::error::ApiError;
use crate::TenantId;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Header carrying the tenant discriminator
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Optional header carrying the acting user, recorded as creator/updater
pub const USER_HEADER: &str = "x-user-id";

/// Calling tenant and acting user
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub actor: Option<Uuid>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest("missing X-Tenant-ID header".to_string()))?;

        let actor = match parts.headers.get(USER_HEADER).and_then(|v| v.to_str().ok()) {
            Some(raw) => Some(parse_id(raw)?),
            None => None,
        };

        Ok(Tenant {
            id: TenantId::new(tenant),
            actor,
        })
    }
}

/// JSON body whose rejection uses the error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Query string whose rejection uses the error envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Parse a path or query identifier
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("invalid id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    #[tokio::test]
    async fn test_tenant_header_required() {
        let (mut parts, _) = HttpRequest::builder().uri("/").body(()).unwrap().into_parts();
        let result = Tenant::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_tenant_and_actor() {
        let user = Uuid::new_v4();
        let (mut parts, _) = HttpRequest::builder()
            .uri("/")
            .header("X-Tenant-ID", "school-1")
            .header("X-User-ID", user.to_string())
            .body(())
            .unwrap()
            .into_parts();
        let tenant = Tenant::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(tenant.id.as_str(), "school-1");
        assert_eq!(tenant.actor, Some(user));
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("abc").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
