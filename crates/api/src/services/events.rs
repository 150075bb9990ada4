//! The event service: creation, retrieval, listing, updates, deletion, and
//! the statistics snapshot.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use validator::ValidationError;

use domain::models::event::AttendeeView;
use domain::models::stats::{
    is_event_soon, percentage, round2, CapacityUtilization, RecentRegistration, StatusBreakdown,
    StatusCount, TimelineBucket,
};
use domain::models::{
    Event, EventSortBy, EventStats, EventSummary, EventView, RegistrationStatus, SortOrder,
    UserPermissions,
};
use persistence::entities::EventEntity;
use persistence::repositories::{
    EventInput, EventListQuery, EventRepository, EventUpdateInput, RegistrationRepository,
};
use shared::clock::Clock;
use shared::pagination::{PageInfo, PageParams};
use shared::validation::{validate_capacity, validate_lead_time, validate_title_charset};

use crate::config::EventsConfig;
use crate::error::ApiError;

/// Error type for event service operations.
#[derive(Debug, Error)]
pub enum EventServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    ScheduleConflict(String),

    #[error("Event not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<EventServiceError> for ApiError {
    fn from(err: EventServiceError) -> Self {
        match err {
            EventServiceError::Validation(msg) => ApiError::Validation(msg),
            EventServiceError::ScheduleConflict(msg) => ApiError::Conflict(msg),
            EventServiceError::NotFound => ApiError::NotFound("Event not found".to_string()),
            EventServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            EventServiceError::BusinessRule(msg) => ApiError::BusinessRule(msg),
            EventServiceError::Database(e) => ApiError::from(e),
        }
    }
}

fn validation_message(err: ValidationError) -> String {
    err.message
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

/// Human label for the conflict window, e.g. "1 hour" or "90 minutes".
fn conflict_window_label(window_secs: u64) -> String {
    if window_secs % 3600 == 0 {
        let hours = window_secs / 3600;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else {
        format!("{} minutes", window_secs / 60)
    }
}

/// A validated-at-the-edge event creation request.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
}

/// Field changes for an event update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
}

/// Filters and paging for the upcoming-events listing.
#[derive(Debug, Clone, Default)]
pub struct ListUpcomingParams {
    pub page: PageParams,
    pub sort_by: Option<EventSortBy>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Service for event lifecycle, queries, and statistics.
#[derive(Clone)]
pub struct EventService {
    pool: PgPool,
    events: EventRepository,
    clock: Clock,
    policy: EventsConfig,
}

impl EventService {
    pub fn new(pool: PgPool, clock: Clock, policy: EventsConfig) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            pool,
            clock,
            policy,
        }
    }

    /// Create an event after semantic validation and the scheduling-conflict
    /// check.
    pub async fn create_event(
        &self,
        owner_id: i64,
        draft: EventDraft,
    ) -> Result<EventEntity, EventServiceError> {
        let now = self.clock.now();

        validate_title_charset(&draft.title)
            .map_err(|e| EventServiceError::Validation(validation_message(e)))?;
        validate_capacity(draft.capacity, self.policy.min_capacity, self.policy.max_capacity)
            .map_err(|e| EventServiceError::BusinessRule(validation_message(e)))?;
        validate_lead_time(
            draft.date_time,
            now,
            self.policy.min_lead_time(),
            self.policy.max_lead_time(),
        )
        .map_err(|e| EventServiceError::Validation(validation_message(e)))?;

        self.check_schedule_conflict(owner_id, draft.date_time, None)
            .await?;

        let entity = self
            .events
            .create(&EventInput {
                title: draft.title,
                description: draft.description,
                date_time: draft.date_time,
                location: draft.location,
                capacity: draft.capacity,
                created_by: owner_id,
            })
            .await?;

        info!(event_id = entity.id, owner_id, "Event created");
        Ok(entity)
    }

    /// Viewer-aware event detail, read under one transaction so the event
    /// row and attendee list are consistent.
    pub async fn get_event(
        &self,
        event_id: i64,
        viewer: Option<i64>,
    ) -> Result<EventView, EventServiceError> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let entity = EventRepository::find_active_for_read(&mut tx, event_id)
            .await?
            .ok_or(EventServiceError::NotFound)?;

        let viewer_registration = match viewer {
            Some(user_id) => {
                RegistrationRepository::find_by_user_and_event(&mut tx, user_id, event_id).await?
            }
            None => None,
        };

        let is_owner = viewer == Some(entity.created_by);
        let is_registered = viewer_registration
            .as_ref()
            .map(|r| r.status() == RegistrationStatus::Confirmed)
            .unwrap_or(false);
        let has_active_registration = viewer_registration
            .as_ref()
            .map(|r| r.status().is_active())
            .unwrap_or(false);

        // Attendee identities are visible to the owner and to confirmed
        // attendees; everyone else only sees the count.
        let attendees = if is_owner || is_registered {
            Some(RegistrationRepository::attendees(&mut tx, event_id).await?)
        } else {
            None
        };

        tx.commit().await?;

        let event = Event::from(entity);
        let can_register = viewer.is_some()
            && !is_owner
            && !has_active_registration
            && !event.has_started(now)
            && !event.is_full();

        Ok(EventView {
            id: event.id,
            available_spots: event.available_spots(),
            is_full: event.is_full(),
            time_until_event: event.seconds_until(now),
            has_started: event.has_started(now),
            user_permissions: UserPermissions {
                can_edit: is_owner,
                is_registered,
                can_register,
            },
            registered_users: attendees.map(|rows| {
                rows.into_iter()
                    .map(|a| AttendeeView {
                        id: a.id,
                        name: a.name,
                        email: a.email,
                        registered_at: a.registered_at,
                    })
                    .collect()
            }),
            registered_count: event.current_registrations as i64,
            title: event.title,
            description: event.description,
            date_time: event.date_time,
            location: event.location,
            capacity: event.capacity,
            current_registrations: event.current_registrations,
            created_by: event.created_by,
            created_at: event.created_at,
            updated_at: event.updated_at,
        })
    }

    /// Active future events matching the filters, paginated.
    pub async fn list_upcoming(
        &self,
        params: ListUpcomingParams,
    ) -> Result<(Vec<EventSummary>, PageInfo), EventServiceError> {
        params
            .page
            .validate()
            .map_err(|e| EventServiceError::Validation(e.to_string()))?;
        if let (Some(from), Some(to)) = (params.date_from, params.date_to) {
            if to <= from {
                return Err(EventServiceError::Validation(
                    "date_to must be after date_from".to_string(),
                ));
            }
        }

        let now = self.clock.now();
        let query = EventListQuery {
            search: params.search,
            location: params.location,
            min_capacity: params.min_capacity,
            max_capacity: params.max_capacity,
            date_from: params.date_from,
            date_to: params.date_to,
            sort_by: params.sort_by,
            sort_order: params.sort_order,
            limit: params.page.limit() as i64,
            offset: params.page.offset(),
        };

        let (rows, total) = self.events.list_upcoming(&query, now).await?;
        let summaries = rows
            .into_iter()
            .map(|entity| EventSummary::from(&Event::from(entity)))
            .collect();

        Ok((summaries, PageInfo::new(&params.page, total)))
    }

    /// Owner-only update; rejects changes that would break invariants.
    pub async fn update_event(
        &self,
        event_id: i64,
        actor_id: i64,
        update: EventUpdate,
    ) -> Result<EventEntity, EventServiceError> {
        let now = self.clock.now();
        let entity = self
            .events
            .find_active_by_id(event_id)
            .await?
            .ok_or(EventServiceError::NotFound)?;

        if entity.created_by != actor_id {
            return Err(EventServiceError::Forbidden(
                "Only the event owner can update this event".to_string(),
            ));
        }

        let title = update.title.unwrap_or_else(|| entity.title.clone());
        validate_title_charset(&title)
            .map_err(|e| EventServiceError::Validation(validation_message(e)))?;

        let capacity = update.capacity.unwrap_or(entity.capacity);
        validate_capacity(capacity, self.policy.min_capacity, self.policy.max_capacity)
            .map_err(|e| EventServiceError::BusinessRule(validation_message(e)))?;
        if capacity < entity.current_registrations {
            return Err(EventServiceError::BusinessRule(format!(
                "Cannot reduce capacity below current registrations ({})",
                entity.current_registrations
            )));
        }

        let date_time = update.date_time.unwrap_or(entity.date_time);
        if date_time != entity.date_time {
            // The schedule is immutable once the event has started.
            if entity.date_time <= now {
                return Err(EventServiceError::BusinessRule(
                    "Cannot reschedule an event that has already started".to_string(),
                ));
            }
            validate_lead_time(
                date_time,
                now,
                self.policy.min_lead_time(),
                self.policy.max_lead_time(),
            )
            .map_err(|e| EventServiceError::Validation(validation_message(e)))?;
            self.check_schedule_conflict(actor_id, date_time, Some(event_id))
                .await?;
        }

        let description = update.description.or_else(|| entity.description.clone());
        let location = update.location.or_else(|| entity.location.clone());

        let updated = self
            .events
            .update(
                event_id,
                &EventUpdateInput {
                    title,
                    description,
                    date_time,
                    location,
                    capacity,
                },
            )
            .await?;

        info!(event_id, actor_id, "Event updated");
        Ok(updated)
    }

    /// Owner-only hard delete; registrations cascade.
    pub async fn delete_event(&self, event_id: i64, actor_id: i64) -> Result<(), EventServiceError> {
        let entity = self
            .events
            .find_active_by_id(event_id)
            .await?
            .ok_or(EventServiceError::NotFound)?;

        if entity.created_by != actor_id {
            return Err(EventServiceError::Forbidden(
                "Only the event owner can delete this event".to_string(),
            ));
        }

        if !self.events.delete(event_id).await? {
            return Err(EventServiceError::NotFound);
        }

        info!(event_id, actor_id, "Event deleted");
        Ok(())
    }

    /// Statistics snapshot, computed inside one read transaction so all
    /// aggregates describe the same instant.
    pub async fn stats(&self, event_id: i64) -> Result<EventStats, EventServiceError> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let entity = EventRepository::find_active_for_read(&mut tx, event_id)
            .await?
            .ok_or(EventServiceError::NotFound)?;

        let counts = RegistrationRepository::status_counts(&mut tx, event_id).await?;
        let (first, latest) =
            RegistrationRepository::first_and_latest_confirmed(&mut tx, event_id).await?;
        let average_delay = RegistrationRepository::average_confirmation_delay_hours(
            &mut tx,
            event_id,
            entity.created_at,
        )
        .await?;
        let timeline = RegistrationRepository::hourly_timeline(&mut tx, event_id).await?;
        let recent = RegistrationRepository::recent_confirmed(&mut tx, event_id, 10).await?;

        tx.commit().await?;

        let event = Event::from(entity);
        let total = counts.total();
        let seconds_until = event.seconds_until(now);
        let percentage_full = round2(
            event.current_registrations as f64 / event.capacity as f64 * 100.0,
        );

        Ok(EventStats {
            event_id: event.id,
            capacity: event.capacity,
            status_breakdown: StatusBreakdown {
                confirmed: StatusCount {
                    count: counts.confirmed,
                    percentage: percentage(counts.confirmed, total),
                },
                cancelled: StatusCount {
                    count: counts.cancelled,
                    percentage: percentage(counts.cancelled, total),
                },
                waitlist: StatusCount {
                    count: counts.waitlist,
                    percentage: percentage(counts.waitlist, total),
                },
                pending: StatusCount {
                    count: counts.pending,
                    percentage: percentage(counts.pending, total),
                },
            },
            registration_rate_percentage: round2(
                counts.confirmed as f64 / event.capacity as f64 * 100.0,
            ),
            first_registration: first,
            latest_registration: latest,
            average_registration_delay_hours: average_delay.map(round2),
            capacity_utilization: CapacityUtilization {
                used: event.current_registrations,
                available: event.available_spots(),
                percentage_full,
            },
            time_until_event: seconds_until,
            is_event_soon: is_event_soon(seconds_until),
            hourly_timeline: timeline
                .into_iter()
                .map(|(hour, count)| TimelineBucket { hour, count })
                .collect(),
            recent_registrations: recent
                .into_iter()
                .map(|r| RecentRegistration {
                    name: r.name,
                    registered_at: r.registered_at,
                })
                .collect(),
            title: event.title,
        })
    }

    async fn check_schedule_conflict(
        &self,
        owner_id: i64,
        date_time: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<(), EventServiceError> {
        let window_secs = self.policy.conflict_window_secs;
        let conflict = self
            .events
            .find_conflicting_for_owner(owner_id, date_time, window_secs as f64, exclude_id)
            .await?;

        if let Some(conflict) = conflict {
            return Err(EventServiceError::ScheduleConflict(format!(
                "You already have an active event ({}) scheduled within {} of this time",
                conflict.title,
                conflict_window_label(window_secs)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_window_label() {
        assert_eq!(conflict_window_label(3600), "1 hour");
        assert_eq!(conflict_window_label(7200), "2 hours");
        assert_eq!(conflict_window_label(5400), "90 minutes");
    }

    #[test]
    fn test_service_error_maps_to_api_error() {
        let err: ApiError = EventServiceError::NotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = EventServiceError::ScheduleConflict("within 1 hour".into()).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = EventServiceError::BusinessRule("maximum capacity".into()).into();
        assert!(matches!(err, ApiError::BusinessRule(_)));

        let err: ApiError = EventServiceError::Forbidden("owner only".into()).into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_validation_message_prefers_message() {
        let mut err = ValidationError::new("some_code");
        err.message = Some("a readable message".into());
        assert_eq!(validation_message(err), "a readable message");

        let err = ValidationError::new("bare_code");
        assert_eq!(validation_message(err), "bare_code");
    }
}
