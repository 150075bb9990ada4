//! Statistics snapshot types and the arithmetic behind them.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Count and share of one registration status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub count: i64,
    pub percentage: f64,
}

/// Counts by status with their percentage of all registration rows.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    pub confirmed: StatusCount,
    pub cancelled: StatusCount,
    pub waitlist: StatusCount,
    pub pending: StatusCount,
}

/// Capacity usage of an event.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityUtilization {
    pub used: i32,
    pub available: i32,
    pub percentage_full: f64,
}

/// One hour of confirmed registrations.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineBucket {
    /// Hour-truncated `registered_at`.
    pub hour: DateTime<Utc>,
    pub count: i64,
}

/// A recent confirmed registration.
#[derive(Debug, Clone, Serialize)]
pub struct RecentRegistration {
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// Read-consistent, point-in-time aggregate of an event's registration
/// state.
#[derive(Debug, Clone, Serialize)]
pub struct EventStats {
    pub event_id: i64,
    pub title: String,
    pub capacity: i32,
    pub status_breakdown: StatusBreakdown,
    /// Confirmed count over capacity, in percent, 2 decimals.
    pub registration_rate_percentage: f64,
    pub first_registration: Option<DateTime<Utc>>,
    pub latest_registration: Option<DateTime<Utc>>,
    /// Mean of (registered_at − event created_at) across confirmed rows,
    /// in hours, 2 decimals. Absent with no confirmed registrations.
    pub average_registration_delay_hours: Option<f64>,
    pub capacity_utilization: CapacityUtilization,
    /// Whole seconds until the event starts; 0 once it has started.
    pub time_until_event: i64,
    /// True iff the event starts within the next 24 hours.
    pub is_event_soon: bool,
    pub hourly_timeline: Vec<TimelineBucket>,
    pub recent_registrations: Vec<RecentRegistration>,
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `total`, 2 decimals; 0.0 for an empty total.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(part as f64 / total as f64 * 100.0)
    }
}

/// True iff the event starts strictly within the next 24 hours.
pub fn is_event_soon(seconds_until: i64) -> bool {
    seconds_until > 0 && seconds_until < 24 * 3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(100.0), 100.0);
        assert_eq!(round2(0.005), 0.01);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3, 4), 75.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_is_event_soon_boundaries() {
        assert!(!is_event_soon(0));
        assert!(is_event_soon(1));
        assert!(is_event_soon(24 * 3600 - 1));
        assert!(!is_event_soon(24 * 3600));
        assert!(!is_event_soon(-5));
    }
}
