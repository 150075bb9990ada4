//! JWT access token utilities.
//!
//! Bearer credentials are HS256-signed access tokens carrying the user id
//! in the subject claim. Issuance and validation both live here so the API
//! layer only ever sees a validated principal id.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, decimal string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token identifier
    pub jti: String,
}

/// Leeway in seconds for clock skew tolerance.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Configuration for token issuance and validation.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Access token lifetime in seconds.
    pub access_token_expiry_secs: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Creates a config from the shared signing secret.
    pub fn new(secret: &str, access_token_expiry_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry_secs,
        }
    }

    /// Issues an access token for a user id.
    ///
    /// The issue instant is passed in so callers can use an injected clock.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (issued_at + Duration::seconds(self.access_token_expiry_secs)).timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates an access token and returns its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = DEFAULT_LEEWAY_SECS;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })
    }

    /// Parses the subject claim of a validated token into a user id.
    pub fn subject_user_id(claims: &Claims) -> Result<i64, JwtError> {
        claims.sub.parse().map_err(|_| JwtError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::new("test-secret-for-unit-tests", 3600)
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let config = test_config();
        let token = config.issue_access_token(42, Utc::now()).unwrap();
        let claims = config.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(JwtConfig::subject_user_id(&claims).unwrap(), 42);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let issued = Utc::now() - Duration::hours(2);
        let token = config.issue_access_token(7, issued).unwrap();
        let err = config.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, JwtError::TokenExpired));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = test_config();
        let err = config.validate_access_token("not-a-token").unwrap_err();
        assert!(matches!(err, JwtError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let other = JwtConfig::new("a-different-secret", 3600);
        let token = config.issue_access_token(1, Utc::now()).unwrap();
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_jti_unique_per_token() {
        let config = test_config();
        let now = Utc::now();
        let a = config.issue_access_token(1, now).unwrap();
        let b = config.issue_access_token(1, now).unwrap();
        let ca = config.validate_access_token(&a).unwrap();
        let cb = config.validate_access_token(&b).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            exp: 0,
            iat: 0,
            jti: String::new(),
        };
        assert!(JwtConfig::subject_user_id(&claims).is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = test_config();
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-secret"));
    }
}
