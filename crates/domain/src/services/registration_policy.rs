//! Registration decision policy.
//!
//! The decision of what a register or cancel attempt should do, given the
//! event row and any existing registration, is a pure function here. The
//! engine executes these decisions inside a transaction while holding the
//! event row lock; keeping the branching free of I/O lets the full decision
//! table be tested without a database.

use chrono::{DateTime, Utc};

use crate::models::event::Event;
use crate::models::registration::RegistrationStatus;

/// What a register attempt should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterDecision {
    /// Insert a new confirmed registration and bump the counter.
    Insert,
    /// Flip the existing cancelled row back to confirmed and bump the
    /// counter.
    Reactivate,
    AlreadyRegistered,
    EventFull,
    EventPast,
    EventNotFound,
}

/// Decides a register attempt.
///
/// `event` is the row as read under the event lock (`None` when absent);
/// `existing` is the status of the caller's registration row, if any.
pub fn decide_register(
    event: Option<&Event>,
    existing: Option<RegistrationStatus>,
    now: DateTime<Utc>,
) -> RegisterDecision {
    let event = match event {
        Some(event) if event.is_active => event,
        _ => return RegisterDecision::EventNotFound,
    };
    if event.has_started(now) {
        return RegisterDecision::EventPast;
    }

    match existing {
        Some(RegistrationStatus::Cancelled) => {
            if event.is_full() {
                RegisterDecision::EventFull
            } else {
                RegisterDecision::Reactivate
            }
        }
        Some(_) => RegisterDecision::AlreadyRegistered,
        None => {
            if event.is_full() {
                RegisterDecision::EventFull
            } else {
                RegisterDecision::Insert
            }
        }
    }
}

/// What a cancel attempt should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDecision {
    /// Flip the confirmed row to cancelled and decrement the counter.
    Cancel,
    NotRegistered,
    EventPast,
    EventNotFound,
    Forbidden,
}

/// Decides a cancel attempt.
///
/// Authorization comes first: without an elevated capability the actor must
/// be cancelling their own registration.
pub fn decide_cancel(
    actor_id: i64,
    target_user_id: i64,
    event: Option<&Event>,
    existing: Option<RegistrationStatus>,
    now: DateTime<Utc>,
) -> CancelDecision {
    if actor_id != target_user_id {
        return CancelDecision::Forbidden;
    }

    let event = match event {
        Some(event) if event.is_active => event,
        _ => return CancelDecision::EventNotFound,
    };
    if event.has_started(now) {
        return CancelDecision::EventPast;
    }

    match existing {
        Some(RegistrationStatus::Confirmed) => CancelDecision::Cancel,
        _ => CancelDecision::NotRegistered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn future_event(capacity: i32, current: i32) -> Event {
        Event {
            id: 7,
            title: "Planning day".to_string(),
            description: None,
            date_time: t0() + Duration::days(14),
            location: None,
            capacity,
            current_registrations: current,
            created_by: 1,
            is_active: true,
            created_at: t0() - Duration::days(1),
            updated_at: t0() - Duration::days(1),
        }
    }

    // Register decision table

    #[test]
    fn test_register_missing_event() {
        assert_eq!(
            decide_register(None, None, t0()),
            RegisterDecision::EventNotFound
        );
    }

    #[test]
    fn test_register_inactive_event_reads_as_missing() {
        let mut event = future_event(3, 0);
        event.is_active = false;
        assert_eq!(
            decide_register(Some(&event), None, t0()),
            RegisterDecision::EventNotFound
        );
    }

    #[test]
    fn test_register_past_event() {
        let event = future_event(3, 0);
        let after = event.date_time + Duration::seconds(1);
        assert_eq!(
            decide_register(Some(&event), None, after),
            RegisterDecision::EventPast
        );
    }

    #[test]
    fn test_register_at_exact_start_is_past() {
        let event = future_event(3, 0);
        assert_eq!(
            decide_register(Some(&event), None, event.date_time),
            RegisterDecision::EventPast
        );
    }

    #[test]
    fn test_register_fresh_with_room() {
        let event = future_event(3, 2);
        assert_eq!(
            decide_register(Some(&event), None, t0()),
            RegisterDecision::Insert
        );
    }

    #[test]
    fn test_register_fresh_when_full() {
        let event = future_event(3, 3);
        assert_eq!(
            decide_register(Some(&event), None, t0()),
            RegisterDecision::EventFull
        );
    }

    #[test]
    fn test_register_capacity_one() {
        let event = future_event(1, 0);
        assert_eq!(
            decide_register(Some(&event), None, t0()),
            RegisterDecision::Insert
        );
        let event = future_event(1, 1);
        assert_eq!(
            decide_register(Some(&event), None, t0()),
            RegisterDecision::EventFull
        );
    }

    #[test]
    fn test_register_already_confirmed() {
        let event = future_event(3, 1);
        assert_eq!(
            decide_register(Some(&event), Some(RegistrationStatus::Confirmed), t0()),
            RegisterDecision::AlreadyRegistered
        );
    }

    #[test]
    fn test_register_reserved_statuses_read_as_registered() {
        let event = future_event(3, 1);
        for status in [RegistrationStatus::Waitlist, RegistrationStatus::Pending] {
            assert_eq!(
                decide_register(Some(&event), Some(status), t0()),
                RegisterDecision::AlreadyRegistered
            );
        }
    }

    #[test]
    fn test_register_reactivates_cancelled_row() {
        let event = future_event(3, 2);
        assert_eq!(
            decide_register(Some(&event), Some(RegistrationStatus::Cancelled), t0()),
            RegisterDecision::Reactivate
        );
    }

    #[test]
    fn test_register_cancelled_row_but_event_full() {
        let event = future_event(3, 3);
        assert_eq!(
            decide_register(Some(&event), Some(RegistrationStatus::Cancelled), t0()),
            RegisterDecision::EventFull
        );
    }

    #[test]
    fn test_register_past_wins_over_full() {
        // Past check happens before the capacity check.
        let event = future_event(1, 1);
        let after = event.date_time + Duration::hours(1);
        assert_eq!(
            decide_register(Some(&event), None, after),
            RegisterDecision::EventPast
        );
    }

    // Cancel decision table

    #[test]
    fn test_cancel_own_confirmed_registration() {
        let event = future_event(3, 1);
        assert_eq!(
            decide_cancel(5, 5, Some(&event), Some(RegistrationStatus::Confirmed), t0()),
            CancelDecision::Cancel
        );
    }

    #[test]
    fn test_cancel_other_users_registration_forbidden() {
        let event = future_event(3, 1);
        assert_eq!(
            decide_cancel(6, 5, Some(&event), Some(RegistrationStatus::Confirmed), t0()),
            CancelDecision::Forbidden
        );
    }

    #[test]
    fn test_cancel_forbidden_checked_before_event_lookup() {
        assert_eq!(decide_cancel(6, 5, None, None, t0()), CancelDecision::Forbidden);
    }

    #[test]
    fn test_cancel_missing_event() {
        assert_eq!(decide_cancel(5, 5, None, None, t0()), CancelDecision::EventNotFound);
    }

    #[test]
    fn test_cancel_inactive_event() {
        let mut event = future_event(3, 1);
        event.is_active = false;
        assert_eq!(
            decide_cancel(5, 5, Some(&event), Some(RegistrationStatus::Confirmed), t0()),
            CancelDecision::EventNotFound
        );
    }

    #[test]
    fn test_cancel_past_event() {
        let event = future_event(3, 1);
        let after = event.date_time + Duration::seconds(1);
        assert_eq!(
            decide_cancel(5, 5, Some(&event), Some(RegistrationStatus::Confirmed), after),
            CancelDecision::EventPast
        );
    }

    #[test]
    fn test_cancel_without_registration() {
        let event = future_event(3, 0);
        assert_eq!(
            decide_cancel(5, 5, Some(&event), None, t0()),
            CancelDecision::NotRegistered
        );
    }

    #[test]
    fn test_cancel_already_cancelled() {
        let event = future_event(3, 0);
        assert_eq!(
            decide_cancel(5, 5, Some(&event), Some(RegistrationStatus::Cancelled), t0()),
            CancelDecision::NotRegistered
        );
    }
}
