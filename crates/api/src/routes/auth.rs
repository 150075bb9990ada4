//! Authentication routes for account creation and login.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::response;
use crate::services::auth::AuthenticatedUser;
use crate::services::AuthService;

/// Request body for account creation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User profile in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// Token envelope in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn auth_payload(authenticated: AuthenticatedUser) -> Value {
    json!({
        "user": UserResponse {
            id: authenticated.user.id,
            name: authenticated.user.name,
            email: authenticated.user.email,
            created_at: authenticated.user.created_at.to_rfc3339(),
        },
        "token": TokenResponse {
            access_token: authenticated.access_token,
            token_type: "Bearer".to_string(),
            expires_in: authenticated.expires_in,
        },
    })
}

/// Create an account.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone(), state.clock.clone());
    let authenticated = service
        .register(&request.name, &request.email, &request.password)
        .await?;

    tracing::info!(user_id = authenticated.user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        response::success_with_message("Account created", auth_payload(authenticated)),
    ))
}

/// Sign in with email and password.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone(), state.clock.clone());
    let authenticated = service.login(&request.email, &request.password).await?;

    tracing::info!(user_id = authenticated.user.id, "User logged in");

    Ok(response::success(auth_payload(authenticated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "long enough".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let request = RegisterRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let request = RegisterRequest {
            name: "Alice".to_string(),
            email: "not-an-email".to_string(),
            password: "long enough".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_deserializes_snake_case() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email": "a@b.co", "password": "pw"}"#).unwrap();
        assert_eq!(request.email, "a@b.co");
        assert!(request.validate().is_ok());
    }
}
