pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Claims expiring after the configured `jwt_expiry_hours`
    pub fn new(user_id: Uuid, email: String) -> Result<Self, JwtError> {
        Self::expiring_in(user_id, email, config::config().security.jwt_expiry_hours)
    }

    pub fn expiring_in(user_id: Uuid, email: String, hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| JwtError::TokenGeneration(format!("token lifetime of {} hours is out of range", hours)))?;

        Ok(Self {
            sub: user_id,
            email,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
    #[error("Token expired")]
    Expired,
    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret.as_str())
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims
pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

/// Caller identity resolved from a valid session token
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Per-request session. Anonymous when no credentials were presented.
#[derive(Clone, Debug, Default)]
pub struct Session {
    caller: Option<AuthUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { caller: None }
    }

    pub fn authenticated(user: AuthUser) -> Self {
        Self { caller: Some(user) }
    }

    pub fn caller(&self) -> Option<&AuthUser> {
        self.caller.as_ref()
    }
}
