use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::debug;

use crate::server::error::ApiError;

/// Admin authentication middleware
///
/// Requires `Authorization: Bearer <ADMIN_API_KEY>`. When no key is
/// configured every admin request fails with a configuration error instead of
/// being let through.
pub async fn admin_auth_middleware(
    admin_api_key: Option<Arc<str>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = admin_api_key else {
        return Err(ApiError::Configuration(
            "ADMIN_API_KEY is not set".to_string(),
        ));
    };

    let authorized = matches!(
        extract_bearer_token(&request),
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes())
    );
    if !authorized {
        debug!(path = %request.uri().path(), "rejected admin request");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Extract Bearer token from Authorization header.
fn extract_bearer_token(request: &Request) -> Option<&str> {
    let auth = request.headers().get("authorization")?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_with_bearer() {
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer secret-key")
            .body(axum::body::Body::empty())
            .unwrap();

        assert_eq!(extract_bearer_token(&request), Some("secret-key"));
    }

    #[test]
    fn test_extract_token_without_bearer_prefix() {
        let request = axum::http::Request::builder()
            .header("authorization", "secret-key")
            .body(axum::body::Body::empty())
            .unwrap();

        assert_eq!(extract_bearer_token(&request), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
