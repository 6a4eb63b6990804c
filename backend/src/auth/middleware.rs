//! Middleware establishing request identity from the session cookie.
//!
//! `authenticate` runs on every request and is the single place the access
//! token is parsed; an absent, expired, or otherwise invalid token leaves
//! the request unauthenticated and processing continues. `require_auth` is
//! layered onto protected routes and turns a missing identity into 401.

use crate::api::common::{ApiError, ApiResponse};
use crate::utils::cookies::{ACCESS_TOKEN_COOKIE, extract_cookie};
use crate::utils::jwt::{JwtUtils, TokenKind};
use axum::{
    Json,
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// The authenticated account's email, recovered from a validated access
/// token. Exists only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
}

/// Derives the request identity from the `accessToken` cookie, if any.
///
/// A missing, expired, tampered, or wrong-kind token all yield `None`;
/// the caller cannot distinguish the cases.
pub fn identity_from_headers(
    headers: &axum::http::HeaderMap,
    jwt: &JwtUtils,
) -> Option<Identity> {
    extract_cookie(headers, ACCESS_TOKEN_COOKIE)
        .and_then(|token| jwt.verify(&token).ok())
        .filter(|claims| claims.kind == TokenKind::Access)
        .map(|claims| Identity { email: claims.sub })
}

/// Populates the request's identity from the `accessToken` cookie.
///
/// Always proceeds; authorization is enforced per-route by `require_auth`.
pub async fn authenticate(
    Extension(jwt): Extension<Arc<JwtUtils>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identity_from_headers(request.headers(), &jwt);

    // Always insert the Option<Identity>, even if it's None
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Rejects requests with no authenticated identity.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Option<Identity>>()
        .cloned()
        .flatten();

    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                "Authentication required",
                "unauthorized",
                None,
            )),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::cookies::session_cookie;
    use axum::http::{HeaderMap, header::COOKIE};

    fn jwt() -> JwtUtils {
        JwtUtils::with_secret("test-secret", 900, 604_800)
    }

    fn headers_with_access_cookie(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, token, 900);
        headers.insert(COOKIE, cookie);
        headers
    }

    #[test]
    fn test_valid_access_cookie_yields_identity() {
        let jwt = jwt();
        let token = jwt.issue("a@x.com", TokenKind::Access).unwrap();
        let identity = identity_from_headers(&headers_with_access_cookie(&token), &jwt).unwrap();
        assert_eq!(identity.email, "a@x.com");
    }

    #[test]
    fn test_expired_cookie_equals_no_cookie() {
        let jwt = jwt();

        // No cookie at all
        assert!(identity_from_headers(&HeaderMap::new(), &jwt).is_none());

        // Token signed with a different secret behaves the same
        let other = JwtUtils::with_secret("other-secret", 900, 604_800);
        let bad = other.issue("a@x.com", TokenKind::Access).unwrap();
        assert!(identity_from_headers(&headers_with_access_cookie(&bad), &jwt).is_none());

        // Garbage token behaves the same
        assert!(identity_from_headers(&headers_with_access_cookie("junk"), &jwt).is_none());
    }

    #[test]
    fn test_refresh_token_not_accepted_as_access() {
        let jwt = jwt();
        let refresh = jwt.issue("a@x.com", TokenKind::Refresh).unwrap();
        assert!(identity_from_headers(&headers_with_access_cookie(&refresh), &jwt).is_none());
    }
}
