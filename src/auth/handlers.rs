use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookie::{cleared_cookie, session_cookie},
        dto::{
            LoginRequest, LoginResponse, LogoutResponse, SignupRequest, SignupResponse,
        },
        jwt::TokenError,
        password::{hash_password_blocking, verify_password_blocking, DUMMY_HASH},
        validation::{sanitize_email, sanitize_name, validate_email, validate_password},
    },
    error::{internal_error, AuthError, ErrorCode},
    rate_limit::enforce_rate_limit,
    state::AppState,
    users::{NewUser, User},
};

/// Signup and login sit behind the per-IP rate limiter; logout does not.
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .merge(limited)
        .route("/auth/logout", post(logout))
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection, "unparseable request body");
        AuthError::invalid_request()
    })
}

fn token_failure(e: TokenError) -> AuthError {
    internal_error("jwt sign")(anyhow::Error::new(e))
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<SignupResponse>), AuthError> {
    let payload = parse_body(payload)?;

    let name = sanitize_name(payload.name.as_deref().unwrap_or_default())
        .map_err(AuthError::invalid_name)?;
    let email = sanitize_email(payload.email.as_deref().unwrap_or_default())
        .map_err(AuthError::invalid_email)?;
    let password = payload.password.unwrap_or_default();
    validate_password(&password).map_err(AuthError::invalid_password)?;

    // Read-then-write: two concurrent signups for one email can both pass this check.
    if state.users.get_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "signup for existing email");
        return Err(AuthError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidCredentials,
            "Invalid credentials",
        ));
    }

    let password_hash = hash_password_blocking(password)
        .await
        .map_err(internal_error("hash password"))?;

    let user = state
        .users
        .create_user(NewUser {
            email,
            password_hash,
            name,
        })
        .await?;

    let token = state.jwt.sign(user.user_id, &user.email).map_err(token_failure)?;
    let cookie = session_cookie(&state.config.cookie, token.clone(), state.jwt.ttl);

    info!(user_id = %user.user_id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(SignupResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

/// Runs bcrypt whether or not the account exists, so response time does not reveal it.
async fn check_credentials(user: Option<&User>, password: String) -> Result<bool, AuthError> {
    let hash = user.map_or(DUMMY_HASH, |u| u.password_hash.as_str()).to_string();
    let matches = verify_password_blocking(password, hash)
        .await
        .map_err(internal_error("verify password"))?;
    Ok(user.is_some() && matches)
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    let payload = parse_body(payload)?;

    let raw_email = payload
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AuthError::missing_field("email"))?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AuthError::missing_field("password"))?;

    let email = sanitize_email(&raw_email)
        .map_err(|_| AuthError::invalid_email("Invalid email format"))?;
    validate_email(&email).map_err(|_| AuthError::invalid_email("Invalid email format"))?;
    validate_password(&password).map_err(|_| AuthError::invalid_password("Invalid password"))?;

    let user = state.users.get_user_by_email(&email).await?;
    let ok = check_credentials(user.as_ref(), password).await?;
    let user = match user {
        Some(user) if ok => user,
        Some(user) => {
            warn!(email = %email, user_id = %user.user_id, "login invalid password");
            return Err(AuthError::invalid_credentials());
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::invalid_credentials());
        }
    };

    let token = state.jwt.sign(user.user_id, &user.email).map_err(token_failure)?;
    let cookie = session_cookie(&state.config.cookie, token.clone(), state.jwt.ttl);

    info!(user_id = %user.user_id, email = %user.email, "user logged in");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    (
        jar.add(cleared_cookie(&state.config.cookie)),
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
}
