use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use uuid::Uuid;

use super::jwt::TokenError;
use crate::{error::AuthError, state::AppState};

/// Validates the JWT from the bearer header or the auth cookie, yielding the user ID.
pub struct AuthUser(pub Uuid);

/// Bearer header wins over the cookie.
pub(crate) fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers, &state.config.cookie.name)
            .ok_or_else(AuthError::missing_token)?;

        match state.jwt.verify(&token) {
            Ok(claims) => Ok(AuthUser(claims.user_id)),
            Err(TokenError::Expired) => Err(AuthError::token_expired()),
            Err(e) => {
                warn!(error = %e, "rejected token");
                Err(AuthError::invalid_token())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            token_from_headers(&headers, "auth_token").as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=from-cookie"),
        );
        assert_eq!(
            token_from_headers(&headers, "auth_token").as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn header_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("auth_token=from-cookie"),
        );
        assert_eq!(
            token_from_headers(&headers, "auth_token").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn ignores_other_schemes_and_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(token_from_headers(&headers, "auth_token"), None);

        headers.insert(axum::http::header::COOKIE, HeaderValue::from_static("auth_token="));
        assert_eq!(token_from_headers(&headers, "auth_token"), None);
    }
}
