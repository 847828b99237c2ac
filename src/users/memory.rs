use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{RepositoryError, Result, UserRepository};
use super::repo_types::{NewUser, User, UserUpdate};

/// In-memory user store for tests and local development.
///
/// Data lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let user = User::from_new(new);
        let mut users = self.users.write().await;
        if users.contains_key(&user.user_id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.user_id.to_string(),
            });
        }
        users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user_id: Uuid, update: &UserUpdate) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or_else(|| RepositoryError::NotFound {
            entity_type: "User",
            id: user_id.to_string(),
        })?;
        update.apply_to(user);
        user.last_modified = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        self.users.write().await.remove(&user_id);
        Ok(())
    }
}
