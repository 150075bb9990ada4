//! Registration domain model, status enum, and operation outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a registration row.
///
/// `Waitlist` and `Pending` are reserved: the schema admits them but no
/// engine transition produces them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    Waitlist,
    Pending,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Waitlist => "waitlist",
            RegistrationStatus::Pending => "pending",
        }
    }

    /// Whether this status counts toward the one-active-row-per-pair rule.
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "waitlist" => Ok(RegistrationStatus::Waitlist),
            "pending" => Ok(RegistrationStatus::Pending),
            _ => Err(format!("Invalid registration status: {}", s)),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record binding a user to an event with a status.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

/// Result of a register operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new confirmed registration was created.
    Created(i64),
    /// A previously cancelled registration was flipped back to confirmed.
    Reactivated(i64),
    AlreadyRegistered,
    EventFull,
    EventPast,
    EventNotFound,
    UserNotFound,
}

/// Result of a cancel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotRegistered,
    EventPast,
    EventNotFound,
    /// Actor attempted to cancel another user's registration.
    Forbidden,
}
