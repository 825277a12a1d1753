use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::api::{errors::ApiError, AppState};

/// Lets a request through when no token is configured, or when it carries
/// `Authorization: Bearer <token>` matching the configured one.
pub async fn require_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.api_token.as_deref() {
        if !is_authorized(req.headers(), expected) {
            warn!(path = %req.uri().path(), "Rejected request without a valid token");
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(req).await)
}

/// Compares in constant time for tokens of equal length.
pub fn is_authorized(headers: &HeaderMap, expected: &str) -> bool {
    bearer_token(headers)
        .is_some_and(|t| bool::from(t.as_bytes().ct_eq(expected.as_bytes())))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then_some(token.trim())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(auth: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        h
    }

    #[test]
    fn matching_bearer_token_is_authorized() {
        assert!(is_authorized(&headers("Bearer s3cret"), "s3cret"));
        assert!(is_authorized(&headers("bearer s3cret"), "s3cret"));
    }

    #[test]
    fn wrong_or_malformed_token_is_rejected() {
        assert!(!is_authorized(&headers("Bearer nope"), "s3cret"));
        assert!(!is_authorized(&headers("Basic s3cret"), "s3cret"));
        assert!(!is_authorized(&headers("s3cret"), "s3cret"));
        assert!(!is_authorized(&headers("Bearer "), "s3cret"));
    }

    #[test]
    fn prefix_or_extended_token_is_rejected() {
        assert!(!is_authorized(&headers("Bearer s3cre"), "s3cret"));
        assert!(!is_authorized(&headers("Bearer s3crets"), "s3cret"));
        assert!(!is_authorized(&headers("Bearer S3CRET"), "s3cret"));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(!is_authorized(&HeaderMap::new(), "s3cret"));
    }
}
