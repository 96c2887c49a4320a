use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;

/// Success envelope: every 2xx body is `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

pub fn data<T: Serialize>(value: T) -> Json<Data<T>> {
    Json(Data { data: value })
}

/// JSON body extractor that answers malformed bodies with the error envelope
/// instead of axum's plain-text rejection.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(_) => Err(ApiError::BadJson),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_envelope_wraps_the_payload() {
        let json = serde_json::to_value(Data { data: vec![1, 2, 3] }).expect("serialize");
        assert_eq!(json, serde_json::json!({ "data": [1, 2, 3] }));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_as_bad_json() {
        let req = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .expect("request");
        let err = ApiJson::<serde_json::Value>::from_request(req, &())
            .await
            .err()
            .expect("rejection");
        assert!(matches!(err, ApiError::BadJson));
    }
}
