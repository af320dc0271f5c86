//! Middleware for JWT token validation and authentication

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::debug;

use crate::{
    AppState,
    error::ApiError,
    jwt::{Claims, JwtService},
    models::UserId,
};

/// Name of the cookie carrying the token when cookies are enabled
pub const JWT_COOKIE: &str = "jwt";

/// Identity of the caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub claims: Claims,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

fn non_empty(token: &str) -> Option<&str> {
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Find the token: `Authorization: Bearer` header, then `?token=`, then the `jwt` cookie
///
/// A source holding an empty token counts as absent.
pub fn lookup_token(
    headers: &HeaderMap,
    query_token: Option<&str>,
    jar: &CookieJar,
) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .and_then(|(_, token)| non_empty(token));

    from_header
        .or_else(|| query_token.and_then(non_empty))
        .or_else(|| jar.get(JWT_COOKIE).and_then(|cookie| non_empty(cookie.value())))
        .map(str::to_owned)
}

/// Reject requests without a valid token and expose the caller as [`AuthUser`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    query: Option<Query<TokenQuery>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let query_token = query.as_ref().and_then(|Query(q)| q.token.as_deref());
    let token = lookup_token(req.headers(), query_token, &jar)
        .ok_or(ApiError::Unauthenticated("missing authentication token"))?;

    let claims = state.jwt_service.validate(&token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthenticated("invalid or expired token")
    })?;
    let id = JwtService::identity(&claims).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthenticated("invalid or expired token")
    })?;

    req.extensions_mut().insert(AuthUser { id, claims });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn test_lookup_order() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let jar = CookieJar::new().add(Cookie::new(JWT_COOKIE, "from-cookie"));

        assert_eq!(
            lookup_token(&headers, Some("from-query"), &jar).as_deref(),
            Some("from-header")
        );
        assert_eq!(
            lookup_token(&HeaderMap::new(), Some("from-query"), &jar).as_deref(),
            Some("from-query")
        );
        assert_eq!(
            lookup_token(&HeaderMap::new(), None, &jar).as_deref(),
            Some("from-cookie")
        );
        assert_eq!(lookup_token(&HeaderMap::new(), None, &CookieJar::new()), None);
    }

    #[test]
    fn test_non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(lookup_token(&headers, None, &CookieJar::new()), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer lower"));
        assert_eq!(
            lookup_token(&headers, None, &CookieJar::new()).as_deref(),
            Some("lower")
        );
    }

    #[test]
    fn test_empty_sources_fall_through() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        let jar = CookieJar::new().add(Cookie::new(JWT_COOKIE, "from-cookie"));

        assert_eq!(
            lookup_token(&headers, Some("from-query"), &jar).as_deref(),
            Some("from-query")
        );
        assert_eq!(
            lookup_token(&headers, Some("  "), &jar).as_deref(),
            Some("from-cookie")
        );

        let empty_cookie = CookieJar::new().add(Cookie::new(JWT_COOKIE, ""));
        assert_eq!(lookup_token(&headers, Some(""), &empty_cookie), None);
    }
}
