//! Injectable time source.
//!
//! Every time-based rule in the system (future-date checks, scheduling
//! windows, "event soon" flags) reads the current instant through a
//! [`Clock`] handle so tests can pin time instead of racing the wall clock.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
enum ClockSource {
    System,
    Fixed(DateTime<Utc>),
}

/// A cloneable handle yielding the current instant.
#[derive(Debug, Clone)]
pub struct Clock(ClockSource);

impl Clock {
    /// A clock backed by the system wall clock.
    pub fn system() -> Self {
        Clock(ClockSource::System)
    }

    /// A clock pinned to a fixed instant. Intended for tests.
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Clock(ClockSource::Fixed(instant))
    }

    /// Returns the current instant.
    pub fn now(&self) -> DateTime<Utc> {
        match &self.0 {
            ClockSource::System => Utc::now(),
            ClockSource::Fixed(instant) => *instant,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let instant = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let clock = Clock::fixed(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = Clock::system();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_clone_preserves_pinned_instant() {
        let instant = Utc.with_ymd_and_hms(2030, 6, 15, 12, 30, 0).unwrap();
        let clock = Clock::fixed(instant);
        let cloned = clock.clone();
        assert_eq!(cloned.now(), instant);
    }

    #[test]
    fn test_default_is_system() {
        let clock = Clock::default();
        let now = Utc::now();
        let diff = (clock.now() - now).num_seconds().abs();
        assert!(diff < 5);
    }
}
