//! Repository implementations for database operations.
//!
//! Pool-level reads and writes are methods on the repository structs.
//! Operations that must run inside a caller-owned transaction (the
//! registration engine's locked section, read-consistent snapshots) are
//! associated functions taking a `&mut PgConnection`, so the caller keeps
//! commit/rollback control.

pub mod event;
pub mod registration;
pub mod user;

pub use event::{EventInput, EventListQuery, EventRepository, EventUpdateInput};
pub use registration::{AttendeeRow, RecentRegistrationRow, RegistrationRepository, StatusCountsRow};
pub use user::UserRepository;
