//! Event domain model and viewer-facing projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled occurrence with a fixed capacity and an owner.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
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

impl Event {
    /// Remaining confirmed-registration slots.
    pub fn available_spots(&self) -> i32 {
        (self.capacity - self.current_registrations).max(0)
    }

    /// Whether the event has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.current_registrations >= self.capacity
    }

    /// Whether the event has started (or passed) at the given instant.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.date_time <= now
    }

    /// Whole seconds until the event starts; 0 once it has started.
    pub fn seconds_until(&self, now: DateTime<Utc>) -> i64 {
        (self.date_time - now).num_seconds().max(0)
    }
}

/// What the viewer of an event detail is allowed to do.
#[derive(Debug, Clone, Serialize)]
pub struct UserPermissions {
    pub can_edit: bool,
    pub is_registered: bool,
    pub can_register: bool,
}

/// A registered attendee as shown to the owner or fellow attendees.
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

/// Viewer-aware event detail with derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
    pub current_registrations: i32,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub available_spots: i32,
    pub is_full: bool,
    /// Whole seconds until the event starts; 0 once it has started.
    pub time_until_event: i64,
    pub has_started: bool,
    pub user_permissions: UserPermissions,
    /// Full attendee list, present only for the owner or a confirmed
    /// attendee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_users: Option<Vec<AttendeeView>>,
    pub registered_count: i64,
}

/// Compact event row for listings.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
    pub current_registrations: i32,
    pub available_spots: i32,
    pub is_full: bool,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            date_time: event.date_time,
            location: event.location.clone(),
            capacity: event.capacity,
            current_registrations: event.current_registrations,
            available_spots: event.available_spots(),
            is_full: event.is_full(),
        }
    }
}

/// Sortable columns for upcoming-event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSortBy {
    DateTime,
    Title,
    Capacity,
    CurrentRegistrations,
    CreatedAt,
}

impl Default for EventSortBy {
    fn default() -> Self {
        Self::DateTime
    }
}

/// Sort direction, spelled `ASC` / `DESC` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Asc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_event(capacity: i32, current: i32) -> Event {
        let t0 = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        Event {
            id: 1,
            title: "Launch party".to_string(),
            description: None,
            date_time: t0 + Duration::days(14),
            location: Some("Rooftop".to_string()),
            capacity,
            current_registrations: current,
            created_by: 10,
            is_active: true,
            created_at: t0,
            updated_at: t0,
        }
    }

    #[test]
    fn test_available_spots() {
        assert_eq!(sample_event(3, 2).available_spots(), 1);
        assert_eq!(sample_event(3, 3).available_spots(), 0);
    }

    #[test]
    fn test_is_full() {
        assert!(!sample_event(3, 2).is_full());
        assert!(sample_event(3, 3).is_full());
    }

    #[test]
    fn test_has_started_boundary() {
        let event = sample_event(3, 0);
        assert!(event.has_started(event.date_time));
        assert!(!event.has_started(event.date_time - Duration::seconds(1)));
    }

    #[test]
    fn test_seconds_until_clamps_at_zero() {
        let event = sample_event(3, 0);
        let after = event.date_time + Duration::hours(1);
        assert_eq!(event.seconds_until(after), 0);
        let before = event.date_time - Duration::seconds(90);
        assert_eq!(event.seconds_until(before), 90);
    }

    #[test]
    fn test_summary_from_event() {
        let event = sample_event(5, 4);
        let summary = EventSummary::from(&event);
        assert_eq!(summary.available_spots, 1);
        assert!(!summary.is_full);
        assert_eq!(summary.title, "Launch party");
    }

    #[test]
    fn test_sort_by_deserializes_snake_case() {
        let sort: EventSortBy = serde_json::from_str(r#""current_registrations""#).unwrap();
        assert_eq!(sort, EventSortBy::CurrentRegistrations);
        let sort: EventSortBy = serde_json::from_str(r#""date_time""#).unwrap();
        assert_eq!(sort, EventSortBy::DateTime);
    }

    #[test]
    fn test_sort_order_deserializes_uppercase() {
        let order: SortOrder = serde_json::from_str(r#""DESC""#).unwrap();
        assert_eq!(order, SortOrder::Desc);
        assert!(serde_json::from_str::<SortOrder>(r#""sideways""#).is_err());
    }
}
