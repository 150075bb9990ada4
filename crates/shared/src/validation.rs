//! Common validation utilities.

use chrono::{DateTime, Duration, Utc};
use validator::ValidationError;

/// Characters permitted in an event title besides alphanumerics and
/// whitespace.
const TITLE_PUNCTUATION: &[char] = &['-', '_', '.', ',', '!', '?', '(', ')'];

/// Validates that an event title contains only alphanumerics, whitespace,
/// and the permitted punctuation set.
pub fn validate_title_charset(title: &str) -> Result<(), ValidationError> {
    let ok = title
        .chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || TITLE_PUNCTUATION.contains(&c));
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("title_charset");
        err.message =
            Some("Title may only contain letters, digits, whitespace and - _ . , ! ? ( )".into());
        Err(err)
    }
}

/// Validates that a capacity lies within the configured bounds.
///
/// The error message names the active bounds so callers can surface them.
pub fn validate_capacity(capacity: i32, min: i32, max: i32) -> Result<(), ValidationError> {
    if (min..=max).contains(&capacity) {
        Ok(())
    } else {
        let mut err = ValidationError::new("capacity_range");
        err.message = Some(format!("Capacity must be between {} and {}", min, max).into());
        Err(err)
    }
}

/// Validates that an event instant lies strictly inside the scheduling
/// window `(now + min_lead, now + max_lead)`.
pub fn validate_lead_time(
    date_time: DateTime<Utc>,
    now: DateTime<Utc>,
    min_lead: Duration,
    max_lead: Duration,
) -> Result<(), ValidationError> {
    if date_time <= now + min_lead {
        let mut err = ValidationError::new("event_too_soon");
        err.message = Some(
            format!(
                "Event must be scheduled more than {} minutes in the future",
                min_lead.num_minutes()
            )
            .into(),
        );
        return Err(err);
    }
    if date_time >= now + max_lead {
        let mut err = ValidationError::new("event_too_far");
        err.message = Some(
            format!(
                "Event must be scheduled less than {} days in the future",
                max_lead.num_days()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Case-folds and trims an email address for storage and lookup.
///
/// Emails are globally unique after folding, so every path that touches the
/// column must go through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    // Title charset tests
    #[test]
    fn test_title_plain_words() {
        assert!(validate_title_charset("Team Standup").is_ok());
    }

    #[test]
    fn test_title_permitted_punctuation() {
        assert!(validate_title_charset("Q3 Review - Part 2 (final), really!?").is_ok());
        assert!(validate_title_charset("launch_day.retro").is_ok());
    }

    #[test]
    fn test_title_rejects_forbidden_characters() {
        assert!(validate_title_charset("50% off <today>").is_err());
        assert!(validate_title_charset("meeting @ noon").is_err());
        assert!(validate_title_charset("a/b testing").is_err());
    }

    #[test]
    fn test_title_unicode_alphanumerics_allowed() {
        assert!(validate_title_charset("Réunion générale").is_ok());
    }

    // Capacity tests
    #[test]
    fn test_capacity_within_bounds() {
        assert!(validate_capacity(1, 1, 10_000).is_ok());
        assert!(validate_capacity(10_000, 1, 10_000).is_ok());
        assert!(validate_capacity(500, 1, 10_000).is_ok());
    }

    #[test]
    fn test_capacity_outside_bounds() {
        assert!(validate_capacity(0, 1, 10_000).is_err());
        assert!(validate_capacity(10_001, 1, 10_000).is_err());
        assert!(validate_capacity(-3, 1, 10_000).is_err());
    }

    #[test]
    fn test_capacity_error_names_active_bounds() {
        let err = validate_capacity(2_000, 1, 1_000).unwrap_err();
        let msg = err.message.unwrap().to_string();
        assert!(msg.contains("1000"));
    }

    // Lead-time tests
    #[test]
    fn test_lead_time_just_past_minimum_accepted() {
        let dt = t0() + Duration::hours(1) + Duration::seconds(1);
        assert!(validate_lead_time(dt, t0(), Duration::hours(1), Duration::days(365)).is_ok());
    }

    #[test]
    fn test_lead_time_below_minimum_rejected() {
        let dt = t0() + Duration::minutes(59);
        let err =
            validate_lead_time(dt, t0(), Duration::hours(1), Duration::days(365)).unwrap_err();
        assert_eq!(err.code, "event_too_soon");
    }

    #[test]
    fn test_lead_time_exactly_minimum_rejected() {
        let dt = t0() + Duration::hours(1);
        assert!(validate_lead_time(dt, t0(), Duration::hours(1), Duration::days(365)).is_err());
    }

    #[test]
    fn test_lead_time_just_below_maximum_accepted() {
        let dt = t0() + Duration::days(365) - Duration::seconds(1);
        assert!(validate_lead_time(dt, t0(), Duration::hours(1), Duration::days(365)).is_ok());
    }

    #[test]
    fn test_lead_time_beyond_maximum_rejected() {
        let dt = t0() + Duration::days(366);
        let err =
            validate_lead_time(dt, t0(), Duration::hours(1), Duration::days(365)).unwrap_err();
        assert_eq!(err.code, "event_too_far");
    }

    // Email normalization tests
    #[test]
    fn test_normalize_email_case_folds() {
        assert_eq!(normalize_email("Alice@Example.COM"), "alice@example.com");
    }

    #[test]
    fn test_normalize_email_trims_whitespace() {
        assert_eq!(normalize_email("  bob@example.com "), "bob@example.com");
    }

    #[test]
    fn test_normalize_email_idempotent() {
        let once = normalize_email("Carol@Example.com");
        assert_eq!(normalize_email(&once), once);
    }
}
