use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::CookieConfig;

fn base(cfg: &CookieConfig, value: String) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure)
        .path("/")
        .build()
}

/// Session cookie carrying the JWT; lives as long as the token.
pub fn session_cookie(cfg: &CookieConfig, token: String, ttl: std::time::Duration) -> Cookie<'static> {
    let mut cookie = base(cfg, token);
    cookie.set_max_age(time::Duration::seconds(
        i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
    ));
    cookie
}

/// Empty cookie with `Max-Age=0` and an expiry in the past.
pub fn cleared_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    let mut cookie = base(cfg, String::new());
    cookie.make_removal();
    cookie
}
