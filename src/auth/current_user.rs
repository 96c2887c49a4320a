use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{claims::TokenKind, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState, users::repo::User};

/// Resolves the bearer token to the active user row it belongs to.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization token".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("invalid authorization token".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            ApiError::BadToken(e)
        })?;

        let user = User::find_by_email(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("user with email {} not exist", claims.sub))
            })?;

        Ok(CurrentUser(user))
    }
}
