use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::users::RepositoryError;

/// Application error codes, rendered in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidEmail,
    InvalidPassword,
    InvalidName,
    MissingField,
    ValidationError,
    NoUpdates,
    InvalidRequest,
    InvalidCredentials,
    InvalidToken,
    TokenExpired,
    MissingToken,
    UserNotFound,
    EmailExists,
    RateLimitExceeded,
    DatabaseError,
    InternalError,
}

const GENERIC_SERVER_MESSAGE: &str = "An error occurred, please try again";

/// Error returned by every handler; carries enough to build the JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    pub field: Option<&'static str>,
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl AuthError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field: None,
            retry_after_secs: None,
        }
    }

    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    pub fn invalid_email(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidEmail, message).with_field("email")
    }

    pub fn invalid_password(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidPassword, message)
            .with_field("password")
    }

    pub fn invalid_name(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidName, message).with_field("name")
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::MissingField,
            format!("{field} is required"),
        )
        .with_field(field)
    }

    pub fn validation(field: &'static str, message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message).with_field(field)
    }

    pub fn no_updates() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::NoUpdates,
            "No valid fields to update",
        )
    }

    pub fn invalid_request() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRequest,
            "Invalid request body",
        )
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidCredentials,
            "Invalid credentials",
        )
    }

    pub fn invalid_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken,
            "Invalid or expired token",
        )
    }

    pub fn token_expired() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired,
            "Session expired, please log in again",
        )
    }

    pub fn missing_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::MissingToken,
            "Authentication required",
        )
    }

    pub fn user_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::UserNotFound, "User not found")
    }

    pub fn email_exists() -> Self {
        Self::new(StatusCode::CONFLICT, ErrorCode::EmailExists, "Email already exists")
            .with_field("email")
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after_secs: Some(retry_after_secs),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                ErrorCode::RateLimitExceeded,
                "Too many requests, please try again later",
            )
        }
    }

    pub fn database() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError,
            GENERIC_SERVER_MESSAGE,
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            GENERIC_SERVER_MESSAGE,
        )
    }

    /// Whether a client may sensibly retry the same request later.
    pub fn is_retryable(&self) -> bool {
        self.status.is_server_error() || self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for AuthError {}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::user_not_found(),
            other => {
                error!(error = %other, "user repository failure");
                Self::database()
            }
        }
    }
}

/// Logs an unexpected failure and hides it behind a generic 500.
pub fn internal_error(context: &'static str) -> impl FnOnce(anyhow::Error) -> AuthError {
    move |e| {
        error!(error = %e, context, "internal failure");
        AuthError::internal()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
            code: self.code,
            field: self.field,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AuthError) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn renders_field_and_code() {
        let (status, _, json) = body_json(AuthError::invalid_email("Invalid email format")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid email format");
        assert_eq!(json["code"], "INVALID_EMAIL");
        assert_eq!(json["field"], "email");
    }

    #[tokio::test]
    async fn omits_absent_field() {
        let (status, _, json) = body_json(AuthError::invalid_credentials()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
        assert!(json.get("field").is_none());
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let (status, headers, json) = body_json(AuthError::rate_limited(42)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "42");
        assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
    }

    #[test]
    fn codes_render_in_screaming_snake_case() {
        let codes = [
            (ErrorCode::InvalidName, "INVALID_NAME"),
            (ErrorCode::ValidationError, "VALIDATION_ERROR"),
            (ErrorCode::RateLimitExceeded, "RATE_LIMIT_EXCEEDED"),
            (ErrorCode::InternalError, "INTERNAL_ERROR"),
        ];
        for (code, wire) in codes {
            assert_eq!(serde_json::to_value(code).unwrap(), wire);
        }
        assert_eq!(AuthError::validation("bio", "too long").code, ErrorCode::ValidationError);
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = AuthError::missing_field("password");
        assert_eq!(err.message, "password is required");
        assert_eq!(err.field, Some("password"));
        assert_eq!(err.code, ErrorCode::MissingField);
    }

    #[test]
    fn retryable_only_for_server_errors_and_throttling() {
        assert!(AuthError::database().is_retryable());
        assert!(AuthError::internal().is_retryable());
        assert!(AuthError::rate_limited(1).is_retryable());
        assert!(!AuthError::invalid_credentials().is_retryable());
        assert!(!AuthError::email_exists().is_retryable());
    }

    #[test]
    fn repository_errors_map_to_not_found_or_database() {
        let not_found: AuthError = RepositoryError::NotFound {
            entity_type: "User",
            id: "x".into(),
        }
        .into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let failed: AuthError = RepositoryError::QueryFailed("boom".into()).into();
        assert_eq!(failed.code, ErrorCode::DatabaseError);
        assert_eq!(failed.message, GENERIC_SERVER_MESSAGE);
    }
}
