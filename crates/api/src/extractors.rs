//! Request extractors.
//!
//! `ApiJson`, `ApiPath` and `ApiQuery` wrap the axum extractors of the same
//! shape so a malformed request still gets the JSON error body.

use arqon_shared::types::TenantId;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::error::ApiError;

/// Header carrying the organization (tenant) of the request.
pub const TENANT_HEADER: &str = "x-org-id";

/// Tenant of the request, read from the `x-org-id` header.
///
/// ```ignore
/// async fn handler(Tenant(tenant): Tenant) -> impl IntoResponse {
///     // every store call is scoped to `tenant`
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenant(pub TenantId);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(TENANT_HEADER) else {
            return Err(ApiError::bad_request(
                "MISSING_TENANT",
                "x-org-id header is required",
            ));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<TenantId>().ok())
            .map(Self)
            .ok_or_else(|| ApiError::bad_request("INVALID_TENANT", "x-org-id must be a UUID"))
    }
}

/// JSON body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use rstest::rstest;

    async fn extract(header: Option<&str>) -> Result<Tenant, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(TENANT_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Tenant::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_tenant_header() {
        let tenant = TenantId::new();
        let extracted = extract(Some(&tenant.to_string())).await.unwrap();
        assert_eq!(extracted, Tenant(tenant));
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "MISSING_TENANT");
    }

    #[rstest]
    #[case("acme")]
    #[case("")]
    #[case("123e4567-e89b-12d3-a456")]
    #[tokio::test]
    async fn test_malformed_header_is_rejected(#[case] header: &str) {
        let err = extract(Some(header)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_TENANT");
    }
}
