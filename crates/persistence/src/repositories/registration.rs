//! Registration repository for database operations.
//!
//! Mutations here run inside the engine's write transaction while the event
//! row lock is held; the statistics reads run inside one read transaction so
//! the snapshot is internally consistent.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::entities::RegistrationEntity;
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, status, registered_at";

/// Per-status row counts for one event.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCountsRow {
    pub confirmed: i64,
    pub cancelled: i64,
    pub waitlist: i64,
    pub pending: i64,
}

impl StatusCountsRow {
    pub fn total(&self) -> i64 {
        self.confirmed + self.cancelled + self.waitlist + self.pending
    }
}

/// Attendee row for the event detail view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendeeRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

/// Row for the most-recent-registrations list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentRegistrationRow {
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// Repository for registration-related database operations.
pub struct RegistrationRepository;

impl RegistrationRepository {
    /// Find the registration row for a (user, event) pair, whatever its
    /// status.
    pub async fn find_by_user_and_event(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE user_id = $1 AND event_id = $2
            "#,
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert a new confirmed registration and return its id.
    pub async fn insert_confirmed(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
        registered_at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("insert_registration");
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO registrations (user_id, event_id, status, registered_at)
            VALUES ($1, $2, 'confirmed', $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(registered_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result.map(|row| row.0)
    }

    /// Flip a cancelled registration back to confirmed, refreshing its
    /// registration instant.
    pub async fn reactivate(
        conn: &mut PgConnection,
        id: i64,
        registered_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("reactivate_registration");
        sqlx::query(
            r#"
            UPDATE registrations
            SET status = 'confirmed', registered_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(registered_at)
        .execute(&mut *conn)
        .await?;
        timer.record();
        Ok(())
    }

    /// Flip a confirmed registration to cancelled. The row is kept so the
    /// user can reactivate later.
    pub async fn mark_cancelled(conn: &mut PgConnection, id: i64) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("cancel_registration");
        sqlx::query(
            r#"
            UPDATE registrations
            SET status = 'cancelled'
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        timer.record();
        Ok(())
    }

    /// Confirmed attendees of an event with their profile fields.
    pub async fn attendees(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<Vec<AttendeeRow>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_attendees");
        let result = sqlx::query_as::<_, AttendeeRow>(
            r#"
            SELECT u.id, u.name, u.email, r.registered_at
            FROM registrations r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1 AND r.status = 'confirmed'
            ORDER BY r.registered_at ASC, u.id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Row counts per status for one event.
    pub async fn status_counts(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<StatusCountsRow, sqlx::Error> {
        let timer = QueryTimer::new("registration_status_counts");
        let result = sqlx::query_as::<_, StatusCountsRow>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COUNT(*) FILTER (WHERE status = 'waitlist') AS waitlist,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending
            FROM registrations
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// First and latest confirmed registration instants.
    pub async fn first_and_latest_confirmed(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), sqlx::Error> {
        let timer = QueryTimer::new("registration_first_latest");
        let row: (Option<DateTime<Utc>>, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            SELECT MIN(registered_at), MAX(registered_at)
            FROM registrations
            WHERE event_id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *conn)
        .await?;
        timer.record();
        Ok(row)
    }

    /// Mean delay between event creation and confirmed registration, in
    /// hours. `None` with no confirmed registrations.
    pub async fn average_confirmation_delay_hours(
        conn: &mut PgConnection,
        event_id: i64,
        event_created_at: DateTime<Utc>,
    ) -> Result<Option<f64>, sqlx::Error> {
        let timer = QueryTimer::new("registration_average_delay");
        let row: (Option<f64>,) = sqlx::query_as(
            r#"
            SELECT (AVG(EXTRACT(EPOCH FROM (registered_at - $2))) / 3600.0)::float8
            FROM registrations
            WHERE event_id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(event_id)
        .bind(event_created_at)
        .fetch_one(&mut *conn)
        .await?;
        timer.record();
        Ok(row.0)
    }

    /// Confirmed registrations bucketed by the hour of `registered_at`.
    pub async fn hourly_timeline(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<Vec<(DateTime<Utc>, i64)>, sqlx::Error> {
        let timer = QueryTimer::new("registration_hourly_timeline");
        let result = sqlx::query_as(
            r#"
            SELECT date_trunc('hour', registered_at) AS hour, COUNT(*) AS count
            FROM registrations
            WHERE event_id = $1 AND status = 'confirmed'
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// The most recent confirmed registrations, newest first.
    pub async fn recent_confirmed(
        conn: &mut PgConnection,
        event_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentRegistrationRow>, sqlx::Error> {
        let timer = QueryTimer::new("registration_recent");
        let result = sqlx::query_as::<_, RecentRegistrationRow>(
            r#"
            SELECT u.name, r.registered_at
            FROM registrations r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1 AND r.status = 'confirmed'
            ORDER BY r.registered_at DESC, r.id DESC
            LIMIT $2
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_total() {
        let counts = StatusCountsRow {
            confirmed: 3,
            cancelled: 1,
            waitlist: 0,
            pending: 0,
        };
        assert_eq!(counts.total(), 4);
    }
}
