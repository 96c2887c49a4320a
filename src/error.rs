use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::jwt::TokenError;

/// Per-field validation messages, keyed by the JSON field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Everything a handler can answer with besides a success payload.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("bad json")]
    BadJson,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadToken(TokenError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadJson | ApiError::BadToken(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                json!({ "error": "something wrong" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn validation_renders_errors_map() {
        let mut errors = FieldErrors::new();
        errors.insert("name", "required field name".into());
        let (status, body) = body_json(ApiError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["name"], "required field name");
    }

    #[tokio::test]
    async fn bad_json_renders_fixed_message() {
        let (status, body) = body_json(ApiError::BadJson).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad json");
    }

    #[tokio::test]
    async fn internal_never_leaks_the_cause() {
        let (status, body) =
            body_json(ApiError::Internal(anyhow::anyhow!("connection refused"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "something wrong");
    }

    #[tokio::test]
    async fn statuses_match_the_taxonomy() {
        assert_eq!(
            ApiError::Unauthorized("wrong password".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::BadToken(TokenError::Expired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("todo with id 7 is not exist".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden("you don't have permissions to access this todo".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Conflict("user already exist".into()).status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn expired_token_message_is_descriptive() {
        let (status, body) = body_json(ApiError::BadToken(TokenError::Expired)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "expired token");
    }
}
