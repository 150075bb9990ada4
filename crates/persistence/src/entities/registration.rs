//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

use domain::models::RegistrationStatus;

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: String,
    pub registered_at: DateTime<Utc>,
}

impl RegistrationEntity {
    /// Parses the status column; the schema CHECK constraint keeps the
    /// column within the known values.
    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus::from_str(&self.status).unwrap_or(RegistrationStatus::Confirmed)
    }
}

impl From<RegistrationEntity> for domain::models::Registration {
    fn from(entity: RegistrationEntity) -> Self {
        let status = entity.status();
        Self {
            id: entity.id,
            user_id: entity.user_id,
            event_id: entity.event_id,
            status,
            registered_at: entity.registered_at,
        }
    }
}
