//! Registration endpoint handlers.
//!
//! Thin translation from engine outcomes to the response envelope; all
//! decisions happen inside the registration engine.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use domain::models::{CancelOutcome, RegisterOutcome};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::response;
use crate::services::RegistrationEngine;

/// Optional request body for registration.
///
/// Naming another user requires an elevated capability that is reserved
/// but not wired to the identity layer, so any foreign `user_id` is
/// rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterBody {
    pub user_id: Option<i64>,
}

fn engine(state: &AppState) -> RegistrationEngine {
    RegistrationEngine::new(state.pool.clone(), state.clock.clone())
}

/// Register for an event.
///
/// POST /api/events/:id/register
pub async fn register(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<i64>,
    body: Option<Json<RegisterBody>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let target_user_id = body.and_then(|Json(b)| b.user_id).unwrap_or(auth.user_id);
    if target_user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Registering on behalf of another user requires elevated permissions".to_string(),
        ));
    }

    let outcome = engine(&state).register(target_user_id, event_id).await?;

    match outcome {
        RegisterOutcome::Created(registration_id) => Ok((
            StatusCode::CREATED,
            response::success_with_message(
                "Registered successfully",
                json!({
                    "registration_id": registration_id,
                    "event_id": event_id,
                    "user_id": target_user_id,
                    "status": "confirmed",
                }),
            ),
        )),
        RegisterOutcome::Reactivated(registration_id) => Ok((
            StatusCode::OK,
            response::success_with_message(
                "Registration reactivated",
                json!({
                    "registration_id": registration_id,
                    "event_id": event_id,
                    "user_id": target_user_id,
                    "status": "confirmed",
                }),
            ),
        )),
        RegisterOutcome::AlreadyRegistered => Err(ApiError::Conflict(
            "You are already registered for this event".to_string(),
        )),
        RegisterOutcome::EventFull => Err(ApiError::BusinessRule(
            "Event has reached maximum capacity".to_string(),
        )),
        RegisterOutcome::EventPast => Err(ApiError::BusinessRule(
            "Cannot register for a past event".to_string(),
        )),
        RegisterOutcome::EventNotFound => {
            Err(ApiError::NotFound("Event not found".to_string()))
        }
        RegisterOutcome::UserNotFound => Err(ApiError::NotFound("User not found".to_string())),
    }
}

/// Cancel a registration.
///
/// DELETE /api/events/:id/register/:user_id
pub async fn cancel(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((event_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    let outcome = engine(&state)
        .cancel(auth.user_id, user_id, event_id)
        .await?;

    match outcome {
        CancelOutcome::Cancelled => Ok(response::success_message("Registration cancelled")),
        CancelOutcome::NotRegistered => Err(ApiError::NotFound(
            "Registration not found".to_string(),
        )),
        CancelOutcome::EventPast => Err(ApiError::BusinessRule(
            "Cannot cancel a registration for a past event".to_string(),
        )),
        CancelOutcome::EventNotFound => Err(ApiError::NotFound("Event not found".to_string())),
        CancelOutcome::Forbidden => Err(ApiError::BusinessRule(
            "You can only cancel your own registrations".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_register_body_deserializes() {
        let body: RegisterBody = serde_json::from_str(r#"{"user_id": 12}"#).unwrap();
        assert_eq!(body.user_id, Some(12));

        let body: RegisterBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.user_id, None);
    }

    #[test]
    fn test_full_event_maps_to_bad_request_naming_capacity() {
        let err = ApiError::BusinessRule("Event has reached maximum capacity".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_foreign_cancel_maps_to_bad_request() {
        let err = ApiError::BusinessRule("You can only cancel your own registrations".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
