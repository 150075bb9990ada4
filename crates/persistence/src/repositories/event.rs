//! Event repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use domain::models::{EventSortBy, SortOrder};

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "id, title, description, date_time, location, capacity, \
     current_registrations, created_by, is_active, created_at, updated_at";

/// Input for creating an event.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
    pub created_by: i64,
}

/// Final field values for an event update.
#[derive(Debug, Clone)]
pub struct EventUpdateInput {
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
}

/// Filters, sort, and page window for the upcoming-events listing.
#[derive(Debug, Clone, Default)]
pub struct EventListQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub sort_by: Option<EventSortBy>,
    pub sort_order: Option<SortOrder>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event with a zeroed registration counter.
    pub async fn create(&self, input: &EventInput) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events (title, description, date_time, location, capacity, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date_time)
        .bind(&input.location)
        .bind(input.capacity)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an active event by ID.
    pub async fn find_active_by_id(&self, id: i64) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE id = $1 AND is_active = TRUE
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Read an active event inside a caller-owned transaction, without
    /// locking it. Used for read-consistent snapshots.
    pub async fn find_active_for_read(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_for_read");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE id = $1 AND is_active = TRUE
            "#,
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Lock the event row for the remainder of the transaction.
    ///
    /// This is the per-event serializer: every registration mutation for an
    /// event takes this lock first, so capacity checks are never stale.
    /// Returns the row whether or not it is active; the caller decides how
    /// to treat inactive events.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_event_for_update");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Adjust the denormalized confirmed-registration counter.
    ///
    /// Must only be called while the caller holds the event row lock. The
    /// schema CHECK constraints reject any result outside `[0, capacity]`.
    pub async fn bump_counter(
        conn: &mut PgConnection,
        event_id: i64,
        delta: i32,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("bump_event_counter");
        let result = sqlx::query(
            r#"
            UPDATE events
            SET current_registrations = current_registrations + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(delta)
        .execute(&mut *conn)
        .await?;
        timer.record();
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Find an active event of the same owner scheduled strictly within
    /// `window_secs` of the given instant, excluding `exclude_id` if set.
    pub async fn find_conflicting_for_owner(
        &self,
        owner_id: i64,
        date_time: DateTime<Utc>,
        window_secs: f64,
        exclude_id: Option<i64>,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_conflicting_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE created_by = $1
              AND is_active = TRUE
              AND date_time > $2 - make_interval(secs => $3)
              AND date_time < $2 + make_interval(secs => $3)
              AND ($4::bigint IS NULL OR id <> $4)
            LIMIT 1
            "#,
        ))
        .bind(owner_id)
        .bind(date_time)
        .bind(window_secs)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply the final field values of an owner-approved update.
    pub async fn update(
        &self,
        id: i64,
        input: &EventUpdateInput,
    ) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            UPDATE events
            SET title = $2, description = $3, date_time = $4, location = $5,
                capacity = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date_time)
        .bind(&input.location)
        .bind(input.capacity)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Hard-delete an event; registrations cascade.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_event");
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// List active future events matching the query, with the total count
    /// across all pages.
    pub async fn list_upcoming(
        &self,
        query: &EventListQuery,
        now: DateTime<Utc>,
    ) -> Result<(Vec<EventEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_upcoming_events");

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM events");
        push_filters(&mut count_qb, query, now);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut rows_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
        push_filters(&mut rows_qb, query, now);
        push_order(&mut rows_qb, query);
        rows_qb.push(" LIMIT ");
        rows_qb.push_bind(query.limit);
        rows_qb.push(" OFFSET ");
        rows_qb.push_bind(query.offset);

        let rows = rows_qb
            .build_query_as::<EventEntity>()
            .fetch_all(&self.pool)
            .await?;

        timer.record();
        Ok((rows, total))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &EventListQuery, now: DateTime<Utc>) {
    qb.push(" WHERE is_active = TRUE AND date_time > ");
    qb.push_bind(now);

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR location ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if let Some(location) = &query.location {
        qb.push(" AND location ILIKE ");
        qb.push_bind(format!("%{}%", location));
    }
    if let Some(min_capacity) = query.min_capacity {
        qb.push(" AND capacity >= ");
        qb.push_bind(min_capacity);
    }
    if let Some(max_capacity) = query.max_capacity {
        qb.push(" AND capacity <= ");
        qb.push_bind(max_capacity);
    }
    if let Some(date_from) = query.date_from {
        qb.push(" AND date_time >= ");
        qb.push_bind(date_from);
    }
    if let Some(date_to) = query.date_to {
        qb.push(" AND date_time <= ");
        qb.push_bind(date_to);
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, query: &EventListQuery) {
    let direction = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    // Column names come from the enum, never from user input.
    match query.sort_by.unwrap_or_default() {
        EventSortBy::DateTime => {
            qb.push(" ORDER BY date_time ");
            qb.push(direction);
            qb.push(", location ASC NULLS LAST");
        }
        EventSortBy::Title => {
            qb.push(" ORDER BY title ");
            qb.push(direction);
            qb.push(", id ASC");
        }
        EventSortBy::Capacity => {
            qb.push(" ORDER BY capacity ");
            qb.push(direction);
            qb.push(", id ASC");
        }
        EventSortBy::CurrentRegistrations => {
            qb.push(" ORDER BY current_registrations ");
            qb.push(direction);
            qb.push(", id ASC");
        }
        EventSortBy::CreatedAt => {
            qb.push(" ORDER BY created_at ");
            qb.push(direction);
            qb.push(", id ASC");
        }
    }
}

#[cfg(test)]
mod tests {
    // Note: EventRepository tests require a database connection and are
    // covered by integration tests.
}
