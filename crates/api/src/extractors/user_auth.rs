//! Bearer credential extractors.
//!
//! `UserAuth` rejects requests without a valid access token; routes with an
//! anonymous viewer take `OptionalUserAuth` instead.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use shared::jwt::JwtConfig;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated principal resolved from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct UserAuth {
    pub user_id: i64,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

fn validate_token(jwt: &JwtConfig, token: &str) -> Result<UserAuth, ApiError> {
    let claims = jwt
        .validate_access_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    let user_id = JwtConfig::subject_user_id(&claims)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    Ok(UserAuth { user_id })
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        validate_token(&state.jwt, token)
    }
}

/// Optional bearer credential: yields an anonymous viewer when the header
/// is absent or does not validate.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

impl OptionalUserAuth {
    pub fn user_id(&self) -> Option<i64> {
        self.0.map(|auth| auth.user_id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = bearer_token(parts).and_then(|token| validate_token(&state.jwt, token).ok());
        Ok(OptionalUserAuth(auth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/events");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extraction() {
        let parts = parts_with_header(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        let parts = parts_with_header(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_validate_token_roundtrip() {
        let jwt = JwtConfig::new("extractor-test-secret", 3600);
        let token = jwt.issue_access_token(99, Utc::now()).unwrap();
        let auth = validate_token(&jwt, &token).unwrap();
        assert_eq!(auth.user_id, 99);
    }

    #[test]
    fn test_validate_token_garbage() {
        let jwt = JwtConfig::new("extractor-test-secret", 3600);
        assert!(validate_token(&jwt, "garbage").is_err());
    }
}
