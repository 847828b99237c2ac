use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as stored in the users table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt, never sent to clients
    pub name: String,
    pub bio: Option<String>,
    pub company: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

/// Input for creating a user; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Partial update. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.bio.is_none() && self.company.is_none()
    }

    /// Applies the present fields onto `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(bio) = &self.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(company) = &self.company {
            user.company = Some(company.clone());
        }
    }
}

impl User {
    /// Builds a fresh record with a new id and both timestamps set to now.
    pub fn from_new(new: NewUser) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            user_id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            bio: None,
            company: None,
            created_at: now,
            last_modified: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::from_new(NewUser {
            email: "ada@example.com".into(),
            password_hash: "$2b$10$hash".into(),
            name: "Ada".into(),
        })
    }

    #[test]
    fn new_user_has_matching_timestamps() {
        let user = sample();
        assert_eq!(user.created_at, user.last_modified);
        assert!(user.bio.is_none());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json["userId"].is_string());
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut user = sample();
        let update = UserUpdate {
            bio: Some("Engineer".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut user);
        assert_eq!(user.name, "Ada");
        assert_eq!(user.bio.as_deref(), Some("Engineer"));
        assert!(UserUpdate::default().is_empty());
    }
}
