use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, new_salt, verify_password};
use crate::auth::{generate_jwt, validate_jwt, AuthUser, Claims, JwtError, Session};
use crate::config;
use crate::database::models::{User, UserProfile};
use crate::database::{DatabaseError, SharedStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered: {0}")]
    EmailTaken(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Returned by register and login
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub user: UserProfile,
    pub expires_in: u64,
}

/// Password accounts and session tokens
pub struct AccountService {
    store: SharedStore,
}

impl AccountService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn register(&self, credentials: Credentials) -> Result<SessionGrant, AuthError> {
        let email = normalize_email(&credentials.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("A valid email address is required".to_string()));
        }
        let min = config::config().security.min_password_length;
        if credentials.password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                min
            )));
        }

        let salt = new_salt();
        let user = User {
            id: Uuid::new_v4(),
            password_hash: hash_password(&credentials.password, &salt),
            salt,
            email,
            created_at: Utc::now(),
        };

        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(DatabaseError::Conflict(_)) => return Err(AuthError::EmailTaken(user.email)),
            Err(e) => return Err(e.into()),
        }

        info!("Registered user {} ({})", user.email, user.id);
        Self::grant(&user)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<SessionGrant, AuthError> {
        let email = normalize_email(&credentials.email);
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&credentials.password, &user.salt, &user.password_hash) {
            warn!("Failed login for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        Self::grant(&user)
    }

    /// The signed-in user's profile
    pub async fn whoami(&self, session: &Session) -> Result<UserProfile, AuthError> {
        let caller = session.caller().ok_or(AuthError::NotAuthenticated)?;
        let user = self
            .store
            .find_user_by_id(caller.user_id)
            .await?
            .ok_or(AuthError::NotAuthenticated)?;
        Ok(UserProfile::from(&user))
    }

    /// Turn a bearer token into a session. The user must still exist.
    pub async fn resolve_session(&self, token: &str) -> Result<Session, AuthError> {
        let claims = validate_jwt(token)?;
        match self.store.find_user_by_id(claims.sub).await? {
            Some(user) => Ok(Session::authenticated(AuthUser {
                user_id: user.id,
                email: user.email,
            })),
            None => {
                warn!("Token presented for unknown user {}", claims.sub);
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    fn grant(user: &User) -> Result<SessionGrant, AuthError> {
        let token = generate_jwt(&Claims::new(user.id, user.email.clone())?)?;
        Ok(SessionGrant {
            token,
            user: UserProfile::from(user),
            expires_in: config::config().security.jwt_expiry_hours.saturating_mul(3600),
        })
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
