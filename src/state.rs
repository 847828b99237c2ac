use std::sync::Arc;

use tracing::info;

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, UserStore};
use crate::rate_limit::RateLimiter;
use crate::users::{DynamoDbUserRepository, InMemoryUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub jwt: JwtKeys,
    pub limiter: RateLimiter,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserRepository> = match config.store {
            UserStore::DynamoDb => {
                let repo = DynamoDbUserRepository::connect(&config.dynamo).await?;
                info!(table = repo.table_name(), region = %config.dynamo.region, "using DynamoDB user store");
                Arc::new(repo)
            }
            UserStore::Memory => {
                info!("using in-memory user store");
                Arc::new(InMemoryUserRepository::new())
            }
        };

        Ok(Self::from_parts(Arc::new(config), users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            limiter: RateLimiter::from_config(&config.rate_limit),
            config,
            users,
        }
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{CookieConfig, DynamoConfig, JwtConfig, RateLimitConfig};

        let config = Arc::new(AppConfig {
            production: false,
            host: "127.0.0.1".into(),
            port: 0,
            store: UserStore::Memory,
            dynamo: DynamoConfig {
                table_name: "users-test".into(),
                region: "us-east-1".into(),
                endpoint: None,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_hours: 24,
            },
            rate_limit: RateLimitConfig {
                max_requests: 5,
                window_secs: 900,
            },
            cookie: CookieConfig {
                name: "auth_token".into(),
                secure: false,
            },
        });

        Self::from_parts(config, Arc::new(InMemoryUserRepository::new()))
    }
}
