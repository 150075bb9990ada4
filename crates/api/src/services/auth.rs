//! Account creation and login.

use sqlx::PgPool;
use thiserror::Error;

use persistence::entities::UserEntity;
use persistence::repositories::UserRepository;
use shared::clock::Clock;
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{self, PasswordError};
use shared::validation::normalize_email;

use crate::error::ApiError;

/// Error type for authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User account is disabled")]
    AccountDisabled,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => {
                ApiError::Conflict("Email already registered".to_string())
            }
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::AccountDisabled => {
                ApiError::Forbidden("User account is disabled".to_string())
            }
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::Database(e) => ApiError::from(e),
        }
    }
}

/// A signed-in principal with a fresh access token.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: UserEntity,
    pub access_token: String,
    pub expires_in: i64,
}

/// Service for account creation and credential verification.
pub struct AuthService {
    users: UserRepository,
    jwt: JwtConfig,
    clock: Clock,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: JwtConfig, clock: Clock) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
            clock,
        }
    }

    /// Creates an account and signs the user in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        plain_password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let email = normalize_email(email);
        let password_hash = password::hash_password(plain_password)?;

        let user = self
            .users
            .create(name, &email, &password_hash)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                    AuthError::EmailAlreadyExists
                }
                _ => AuthError::Database(e),
            })?;

        self.issue(user)
    }

    /// Verifies credentials and signs the user in.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, email: &str, plain_password: &str) -> Result<AuthenticatedUser, AuthError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(plain_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.issue(user)
    }

    fn issue(&self, user: UserEntity) -> Result<AuthenticatedUser, AuthError> {
        let access_token = self.jwt.issue_access_token(user.id, self.clock.now())?;
        Ok(AuthenticatedUser {
            user,
            access_token,
            expires_in: self.jwt.access_token_expiry_secs,
        })
    }
}
