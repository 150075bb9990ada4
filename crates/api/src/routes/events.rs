//! Event endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use domain::models::{EventSortBy, SortOrder};
use persistence::entities::EventEntity;
use shared::pagination::PageParams;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{OptionalUserAuth, UserAuth};
use crate::response;
use crate::services::events::{EventDraft, EventUpdate, ListUpcomingParams};
use crate::services::EventService;

/// Request body for event creation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub date_time: DateTime<Utc>,

    #[validate(length(max = 500, message = "Location must be at most 500 characters"))]
    pub location: Option<String>,

    pub capacity: i32,
}

/// Request body for event updates; absent fields stay unchanged.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub date_time: Option<DateTime<Utc>>,

    #[validate(length(max = 500, message = "Location must be at most 500 characters"))]
    pub location: Option<String>,

    pub capacity: Option<i32>,
}

/// Query parameters for the upcoming-events listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEventsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<EventSortBy>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Full event row in responses.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
    pub current_registrations: i32,
    pub created_by: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for EventResponse {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            date_time: entity.date_time,
            location: entity.location,
            capacity: entity.capacity,
            current_registrations: entity.current_registrations,
            created_by: entity.created_by,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

fn event_service(state: &AppState) -> EventService {
    EventService::new(
        state.pool.clone(),
        state.clock.clone(),
        state.config.events.clone(),
    )
}

/// Create an event.
///
/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    request.validate()?;

    let entity = event_service(&state)
        .create_event(
            auth.user_id,
            EventDraft {
                title: request.title,
                description: request.description,
                date_time: request.date_time,
                location: request.location,
                capacity: request.capacity,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        response::success_with_message("Event created", EventResponse::from(entity)),
    ))
}

/// Viewer-aware event detail.
///
/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    auth: OptionalUserAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let view = event_service(&state)
        .get_event(event_id, auth.user_id())
        .await?;
    Ok(response::success(view))
}

/// Paginated listing of active future events.
///
/// GET /api/events/upcoming
pub async fn list_upcoming(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Value>, ApiError> {
    let (events, pagination) = event_service(&state)
        .list_upcoming(ListUpcomingParams {
            page: PageParams {
                page: query.page,
                limit: query.limit,
            },
            sort_by: query.sort_by,
            sort_order: query.sort_order,
            search: query.search,
            location: query.location,
            min_capacity: query.min_capacity,
            max_capacity: query.max_capacity,
            date_from: query.date_from,
            date_to: query.date_to,
        })
        .await?;

    Ok(response::success(json!({
        "events": events,
        "pagination": pagination,
    })))
}

/// Owner-only event update.
///
/// PUT /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<i64>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<Value>, ApiError> {
    request.validate()?;

    let entity = event_service(&state)
        .update_event(
            event_id,
            auth.user_id,
            EventUpdate {
                title: request.title,
                description: request.description,
                date_time: request.date_time,
                location: request.location,
                capacity: request.capacity,
            },
        )
        .await?;

    Ok(response::success_with_message(
        "Event updated",
        EventResponse::from(entity),
    ))
}

/// Owner-only hard delete.
///
/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    event_service(&state)
        .delete_event(event_id, auth.user_id)
        .await?;
    Ok(response::success_message("Event deleted"))
}

/// Statistics snapshot.
///
/// GET /api/events/:id/stats
pub async fn event_stats(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let stats = event_service(&state).stats(event_id).await?;
    Ok(response::success(stats))
}
