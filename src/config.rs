use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Upper bound for `JWT_EXPIRATION_HOURS` (one year).
pub const MAX_JWT_TTL_HOURS: i64 = 8760;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

/// Which user store backs the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStore {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamoConfig {
    pub table_name: String,
    pub region: String,
    /// Overrides the regional endpoint, e.g. `http://localhost:8000` for DynamoDB Local.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub production: bool,
    pub host: String,
    pub port: u16,
    pub store: UserStore,
    pub dynamo: DynamoConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cookie: CookieConfig,
}

/// Non-secret view of the configuration, safe to return to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub dynamo_db_table_name: String,
    pub aws_region: String,
    pub jwt_secret_set: bool,
    pub jwt_expiration_hours: i64,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let production = get("APP_ENV", "development").eq_ignore_ascii_case("production");

        let secret = lookup("JWT_SECRET").unwrap_or_default();
        if production && secret.is_empty() {
            anyhow::bail!("JWT_SECRET environment variable is required in production");
        }

        let ttl_hours: i64 = get("JWT_EXPIRATION_HOURS", "24")
            .parse()
            .context("parse JWT_EXPIRATION_HOURS")?;
        anyhow::ensure!(
            (1..=MAX_JWT_TTL_HOURS).contains(&ttl_hours),
            "JWT_EXPIRATION_HOURS must be between 1 and {MAX_JWT_TTL_HOURS}, got {ttl_hours}"
        );

        let store = match get("USER_STORE", "dynamodb").to_lowercase().as_str() {
            "dynamodb" => UserStore::DynamoDb,
            "memory" => UserStore::Memory,
            other => anyhow::bail!("unknown USER_STORE {other:?}, expected dynamodb or memory"),
        };

        Ok(Self {
            production,
            host: get("APP_HOST", "0.0.0.0"),
            port: get("APP_PORT", "8080").parse().context("parse APP_PORT")?,
            store,
            dynamo: DynamoConfig {
                table_name: get("DYNAMODB_TABLE_NAME", "users-dev"),
                region: get("AWS_REGION", "us-east-1"),
                endpoint: lookup("DYNAMODB_ENDPOINT").filter(|v| !v.is_empty()),
            },
            jwt: JwtConfig {
                secret,
                ttl_hours,
            },
            rate_limit: RateLimitConfig {
                max_requests: get("RATE_LIMIT_MAX_REQUESTS", "5")
                    .parse()
                    .context("parse RATE_LIMIT_MAX_REQUESTS")?,
                window_secs: get("RATE_LIMIT_WINDOW_SECS", "900")
                    .parse()
                    .context("parse RATE_LIMIT_WINDOW_SECS")?,
            },
            cookie: CookieConfig {
                name: get("AUTH_COOKIE_NAME", "auth_token"),
                secure: production,
            },
        })
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            dynamo_db_table_name: self.dynamo.table_name.clone(),
            aws_region: self.dynamo.region.clone(),
            jwt_secret_set: !self.jwt.secret.is_empty(),
            jwt_expiration_hours: self.jwt.ttl_hours,
            rate_limit_max_requests: self.rate_limit.max_requests,
            rate_limit_window_ms: self.rate_limit.window_secs * 1000,
        }
    }
}
