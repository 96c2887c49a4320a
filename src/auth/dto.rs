use serde::{Deserialize, Serialize};

/// Request body for POST /auth/signup. Fields are optional so presence is
/// checked by the validator, not by serde.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for POST /auth/signin.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for PATCH /auth/refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Token pair returned by signin and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
