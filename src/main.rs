use std::time::Duration;

mod app;
mod auth;
mod config;
mod error;
mod profile;
mod rate_limit;
mod state;
mod users;

use crate::{app::build_app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "zetca_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.jwt.secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; signup and login will fail");
    }

    let state = AppState::init(config).await?;
    let _janitor = state.limiter.spawn_janitor(Duration::from_secs(60));

    let config = state.config.clone();
    app::serve(build_app(state), &config).await
}
