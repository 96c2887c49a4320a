use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    claims::TokenKind,
    dto::{RefreshRequest, SigninRequest, SignupRequest, TokenPair},
    jwt::{JwtKeys, TokenError},
    password::{hash_password, verify_password},
};
use crate::{
    error::{ApiError, FieldErrors},
    extract::{data, ApiJson, Data},
    state::AppState,
    users::{dto::UserProfile, repo::User},
    validate::FieldValidator,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/refresh", patch(refresh))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<Data<UserProfile>>), ApiError> {
    let mut v = FieldValidator::new();
    let name = v.required("name", payload.name);
    v.length("name", &name, 1, 128);
    let email = v.required("email", payload.email);
    v.length("email", &email, 1, 256);
    v.email_format("email", &email);
    let password = v.required("password", payload.password);
    v.min_length("password", &password, 8);
    v.finish()?;

    let hash = hash_password(&password)?;

    let user = User::create(&state.db, &name, &email, &hash)
        .await
        .map_err(|e| map_signup_error(e, &email))?;

    info!(user_id = user.id, email = %user.email, "user signed up");
    Ok((StatusCode::CREATED, data(UserProfile::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SigninRequest>,
) -> Result<Json<Data<TokenPair>>, ApiError> {
    let mut v = FieldValidator::new();
    let email = v.required("email", payload.email);
    v.length("email", &email, 1, 256);
    v.email_format("email", &email);
    let password = v.required("password", payload.password);
    v.min_length("password", &password, 8);
    v.finish()?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user with email {email} not exist")))?;

    if !verify_password(&password, &user.password)? {
        warn!(user_id = user.id, "signin with wrong password");
        return Err(ApiError::Unauthorized("wrong password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user.email)?;
    let refresh_token = keys.sign_refresh(&user.email)?;

    info!(user_id = user.id, email = %user.email, "user signed in");
    Ok(data(TokenPair {
        access_token,
        refresh_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<Data<TokenPair>>, ApiError> {
    let mut v = FieldValidator::new();
    let refresh_token = v.required("refreshToken", payload.refresh_token);
    v.not_empty("refreshToken", &refresh_token);
    v.finish()?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&refresh_token, TokenKind::Refresh)
        .map_err(refresh_token_error)?;

    let user = User::find_by_email(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user with email {} not exist", claims.sub)))?;

    // New access token, same refresh token.
    let access_token = keys.sign_access(&user.email)?;

    info!(user_id = user.id, "access token refreshed");
    Ok(data(TokenPair {
        access_token,
        refresh_token,
    }))
}

/// A duplicate active email is the only database error signup reports as its
/// own; everything else stays an opaque 500.
fn map_signup_error(e: sqlx::Error, email: &str) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            warn!(email = %email, "signup with taken email");
            return ApiError::Conflict("user already exist".into());
        }
    }
    ApiError::Internal(e.into())
}

/// The refresh endpoint reports token problems against the `refreshToken`
/// field, like its other validation failures.
fn refresh_token_error(e: TokenError) -> ApiError {
    let mut errors = FieldErrors::new();
    errors.insert("refreshToken", e.to_string());
    ApiError::Validation(errors)
}
