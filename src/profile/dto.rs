use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::User;

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse<T> {
    pub success: bool,
    pub user: T,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl From<User> for Profile {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            email: u.email,
            name: u.name,
            company: u.company,
            bio: u.bio,
        }
    }
}

impl From<User> for UpdatedProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            email: u.email,
            name: u.name,
            company: u.company,
            bio: u.bio,
            last_modified: u.last_modified,
        }
    }
}
