use axum::Router;

use crate::state::AppState;

mod claims;
pub mod cookie;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod validation;

pub use extractors::AuthUser;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().merge(handlers::auth_routes(state))
}
