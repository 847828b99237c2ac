use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info, instrument, warn};

use super::dto::{Profile, ProfileResponse, UpdateProfileRequest, UpdatedProfile};
use crate::{
    auth::{
        validation::{sanitize_bio, sanitize_company, sanitize_email, sanitize_name},
        AuthUser,
    },
    error::AuthError,
    state::AppState,
    users::UserUpdate,
};

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse<Profile>>, AuthError> {
    let user = state
        .users
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "profile requested for missing user");
            AuthError::user_not_found()
        })?;

    Ok(Json(ProfileResponse {
        success: true,
        user: user.into(),
    }))
}

/// Sanitizes every provided field, stopping at the first invalid one
/// (checked in the order name, email, bio, company).
fn build_update(req: UpdateProfileRequest) -> Result<UserUpdate, AuthError> {
    fn field(
        raw: Option<String>,
        name: &'static str,
        sanitize: fn(&str) -> Result<String, &'static str>,
    ) -> Result<Option<String>, AuthError> {
        raw.map(|v| sanitize(&v).map_err(|msg| AuthError::validation(name, msg)))
            .transpose()
    }

    Ok(UserUpdate {
        name: field(req.name, "name", sanitize_name)?,
        email: field(req.email, "email", sanitize_email)?,
        bio: field(req.bio, "bio", sanitize_bio)?,
        company: field(req.company, "company", sanitize_company)?,
    })
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse<UpdatedProfile>>, AuthError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection, "unparseable request body");
        AuthError::invalid_request()
    })?;

    let update = build_update(req)?;
    if update.is_empty() {
        return Err(AuthError::no_updates());
    }

    // Same read-then-write window as signup.
    if let Some(email) = &update.email {
        if let Some(existing) = state.users.get_user_by_email(email).await? {
            if existing.user_id != user_id {
                warn!(user_id = %user_id, email = %email, "email already taken");
                return Err(AuthError::email_exists());
            }
        }
    }

    let user = state.users.update_user(user_id, &update).await?;

    info!(user_id = %user.user_id, "profile updated");
    Ok(Json(ProfileResponse {
        success: true,
        user: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn update_sanitizes_present_fields() {
        let update = build_update(UpdateProfileRequest {
            name: Some(" <b>Ada</b> ".into()),
            email: Some("Ada@Example.com".into()),
            bio: Some(String::new()),
            company: None,
        })
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Ada"));
        assert_eq!(update.email.as_deref(), Some("ada@example.com"));
        assert_eq!(update.bio.as_deref(), Some(""));
        assert_eq!(update.company, None);
    }

    #[test]
    fn first_invalid_field_is_reported() {
        let err = build_update(UpdateProfileRequest {
            name: Some("ok".into()),
            email: Some("nope".into()),
            bio: Some("b".repeat(501)),
            company: None,
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field, Some("email"));
        assert_eq!(err.message, "Invalid email format");
    }

    #[test]
    fn empty_request_builds_empty_update() {
        let update = build_update(UpdateProfileRequest::default()).unwrap();
        assert!(update.is_empty());
    }
}
