use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserUpdate};

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Persistence for user accounts.
///
/// Email uniqueness is not enforced here; callers pre-check with
/// [`UserRepository::get_user_by_email`] before writing.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Fails with `NotFound` when the user does not exist.
    async fn update_user(&self, user_id: Uuid, update: &UserUpdate) -> Result<User>;
    async fn delete_user(&self, user_id: Uuid) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let error = RepositoryError::NotFound {
            entity_type: "User",
            id: "abc-123".to_string(),
        };
        assert_eq!(error.to_string(), "User not found: abc-123");
    }

    #[test]
    fn query_failed_display() {
        let error = RepositoryError::QueryFailed("Table not found".to_string());
        assert_eq!(error.to_string(), "Query failed: Table not found");
    }
}
