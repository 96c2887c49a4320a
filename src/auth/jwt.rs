use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("expired token")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            access_ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self::new(&secret, issuer, access_ttl_minutes, refresh_ttl_minutes)
    }
}

impl JwtKeys {
    pub fn new(
        secret: &str,
        issuer: String,
        access_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }

    fn sign_with_kind(&self, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(email = %email, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(email, TokenKind::Access)
    }

    pub fn sign_refresh(&self, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(email, TokenKind::Refresh)
    }

    /// Checks signature, expiry, issuer and purpose; a token of the wrong
    /// kind is invalid, never merely rejected downstream.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        if data.claims.kind != expected {
            return Err(TokenError::Invalid);
        }
        debug!(email = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }
}
