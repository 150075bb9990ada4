//! The registration engine.
//!
//! All registration mutations for an event run inside one write transaction
//! that first takes the event row lock (`SELECT … FOR UPDATE`), so they are
//! totally ordered per event and capacity checks are never stale. The
//! branching itself lives in `domain::services::registration_policy`; this
//! module owns the transaction, the counter bump under the lock, and the
//! bounded retry on transient storage failures.

use sqlx::PgPool;
use std::time::Duration;

use domain::models::{CancelOutcome, Event, RegisterOutcome};
use domain::services::registration_policy::{
    decide_cancel, decide_register, CancelDecision, RegisterDecision,
};
use persistence::repositories::{EventRepository, RegistrationRepository, UserRepository};
use shared::clock::Clock;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 25;
const BACKOFF_CAP_MS: u64 = 100;

/// Serialization failures, deadlocks, and connection-level faults are worth
/// retrying; everything else surfaces unchanged.
fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

/// Exponential backoff delay for the given 1-based attempt, capped.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis((BACKOFF_BASE_MS << (attempt - 1)).min(BACKOFF_CAP_MS))
}

/// Executes registration mutations under the per-event serializer.
#[derive(Clone)]
pub struct RegistrationEngine {
    pool: PgPool,
    clock: Clock,
}

impl RegistrationEngine {
    pub fn new(pool: PgPool, clock: Clock) -> Self {
        Self { pool, clock }
    }

    /// Register a user for an event.
    pub async fn register(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<RegisterOutcome, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_register(user_id, event_id).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                    tracing::warn!(attempt, error = %err, "Retrying register after transient storage error");
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Cancel a registration on behalf of `actor_id`.
    pub async fn cancel(
        &self,
        actor_id: i64,
        target_user_id: i64,
        event_id: i64,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_cancel(actor_id, target_user_id, event_id).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                    tracing::warn!(attempt, error = %err, "Retrying cancel after transient storage error");
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Register several users inside one outer transaction, locking the
    /// event once. Outcomes are returned in input order; capacity is
    /// tracked across iterations.
    pub async fn register_batch(
        &self,
        event_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, RegisterOutcome)>, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_register_batch(event_id, user_ids).await {
                Ok(outcomes) => return Ok(outcomes),
                Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                    tracing::warn!(attempt, error = %err, "Retrying batch register after transient storage error");
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_register(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<RegisterOutcome, sqlx::Error> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let event = EventRepository::lock_for_update(&mut tx, event_id)
            .await?
            .map(Event::from);
        if event.is_none() {
            tx.rollback().await?;
            return Ok(RegisterOutcome::EventNotFound);
        }
        if !UserRepository::exists(&mut tx, user_id).await? {
            tx.rollback().await?;
            return Ok(RegisterOutcome::UserNotFound);
        }

        let existing =
            RegistrationRepository::find_by_user_and_event(&mut tx, user_id, event_id).await?;

        match decide_register(event.as_ref(), existing.as_ref().map(|r| r.status()), now) {
            RegisterDecision::Insert => {
                let id = RegistrationRepository::insert_confirmed(&mut tx, user_id, event_id, now)
                    .await?;
                EventRepository::bump_counter(&mut tx, event_id, 1).await?;
                tx.commit().await?;
                tracing::info!(user_id, event_id, registration_id = id, "Registration created");
                Ok(RegisterOutcome::Created(id))
            }
            RegisterDecision::Reactivate => match existing {
                Some(registration) => {
                    RegistrationRepository::reactivate(&mut tx, registration.id, now).await?;
                    EventRepository::bump_counter(&mut tx, event_id, 1).await?;
                    tx.commit().await?;
                    tracing::info!(
                        user_id,
                        event_id,
                        registration_id = registration.id,
                        "Registration reactivated"
                    );
                    Ok(RegisterOutcome::Reactivated(registration.id))
                }
                // Reactivate is only decided for an existing row.
                None => Err(sqlx::Error::RowNotFound),
            },
            RegisterDecision::AlreadyRegistered => {
                tx.rollback().await?;
                Ok(RegisterOutcome::AlreadyRegistered)
            }
            RegisterDecision::EventFull => {
                tx.rollback().await?;
                Ok(RegisterOutcome::EventFull)
            }
            RegisterDecision::EventPast => {
                tx.rollback().await?;
                Ok(RegisterOutcome::EventPast)
            }
            RegisterDecision::EventNotFound => {
                tx.rollback().await?;
                Ok(RegisterOutcome::EventNotFound)
            }
        }
    }

    async fn try_cancel(
        &self,
        actor_id: i64,
        target_user_id: i64,
        event_id: i64,
    ) -> Result<CancelOutcome, sqlx::Error> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let event = EventRepository::lock_for_update(&mut tx, event_id)
            .await?
            .map(Event::from);
        let existing =
            RegistrationRepository::find_by_user_and_event(&mut tx, target_user_id, event_id)
                .await?;

        match decide_cancel(
            actor_id,
            target_user_id,
            event.as_ref(),
            existing.as_ref().map(|r| r.status()),
            now,
        ) {
            CancelDecision::Cancel => match existing {
                Some(registration) => {
                    RegistrationRepository::mark_cancelled(&mut tx, registration.id).await?;
                    EventRepository::bump_counter(&mut tx, event_id, -1).await?;
                    tx.commit().await?;
                    tracing::info!(
                        user_id = target_user_id,
                        event_id,
                        registration_id = registration.id,
                        "Registration cancelled"
                    );
                    Ok(CancelOutcome::Cancelled)
                }
                // Cancel is only decided for an existing confirmed row.
                None => Err(sqlx::Error::RowNotFound),
            },
            CancelDecision::NotRegistered => {
                tx.rollback().await?;
                Ok(CancelOutcome::NotRegistered)
            }
            CancelDecision::EventPast => {
                tx.rollback().await?;
                Ok(CancelOutcome::EventPast)
            }
            CancelDecision::EventNotFound => {
                tx.rollback().await?;
                Ok(CancelOutcome::EventNotFound)
            }
            CancelDecision::Forbidden => {
                tx.rollback().await?;
                Ok(CancelOutcome::Forbidden)
            }
        }
    }

    async fn try_register_batch(
        &self,
        event_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<(i64, RegisterOutcome)>, sqlx::Error> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let mut event = EventRepository::lock_for_update(&mut tx, event_id)
            .await?
            .map(Event::from);
        let mut outcomes = Vec::with_capacity(user_ids.len());

        for &user_id in user_ids {
            if event.is_none() {
                outcomes.push((user_id, RegisterOutcome::EventNotFound));
                continue;
            }
            if !UserRepository::exists(&mut tx, user_id).await? {
                outcomes.push((user_id, RegisterOutcome::UserNotFound));
                continue;
            }

            let existing =
                RegistrationRepository::find_by_user_and_event(&mut tx, user_id, event_id).await?;

            let outcome =
                match decide_register(event.as_ref(), existing.as_ref().map(|r| r.status()), now) {
                    RegisterDecision::Insert => {
                        let id = RegistrationRepository::insert_confirmed(
                            &mut tx, user_id, event_id, now,
                        )
                        .await?;
                        EventRepository::bump_counter(&mut tx, event_id, 1).await?;
                        if let Some(event) = event.as_mut() {
                            event.current_registrations += 1;
                        }
                        RegisterOutcome::Created(id)
                    }
                    RegisterDecision::Reactivate => match &existing {
                        Some(registration) => {
                            RegistrationRepository::reactivate(&mut tx, registration.id, now)
                                .await?;
                            EventRepository::bump_counter(&mut tx, event_id, 1).await?;
                            if let Some(event) = event.as_mut() {
                                event.current_registrations += 1;
                            }
                            RegisterOutcome::Reactivated(registration.id)
                        }
                        None => return Err(sqlx::Error::RowNotFound),
                    },
                    RegisterDecision::AlreadyRegistered => RegisterOutcome::AlreadyRegistered,
                    RegisterDecision::EventFull => RegisterOutcome::EventFull,
                    RegisterDecision::EventPast => RegisterOutcome::EventPast,
                    RegisterDecision::EventNotFound => RegisterOutcome::EventNotFound,
                };
            outcomes.push((user_id, outcome));
        }

        tx.commit().await?;
        Ok(outcomes)
    }
}
