use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::User;

/// A JSON value that counts only when it is a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Str(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

/// Non-string values (numbers, objects, null) read as absent.
fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Str(s)) => Some(s),
        Some(Loose::Other(_)) | None => None,
    })
}

/// Request body for signup. Fields are optional so missing ones get our own error.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub token: String,
    pub user: SignupUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: SessionUser,
}

/// Public part of the user returned after login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub company: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

impl From<User> for SignupUser {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

impl From<User> for SessionUser {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            email: u.email,
            name: u.name,
            bio: u.bio,
            company: u.company,
            created_at: u.created_at,
            last_modified: u.last_modified,
        }
    }
}
