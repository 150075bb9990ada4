//! Domain models for EventHub.

pub mod event;
pub mod registration;
pub mod stats;
pub mod user;

pub use event::{AttendeeView, Event, EventSortBy, EventSummary, EventView, SortOrder, UserPermissions};
pub use registration::{CancelOutcome, RegisterOutcome, Registration, RegistrationStatus};
pub use stats::EventStats;
pub use user::User;
