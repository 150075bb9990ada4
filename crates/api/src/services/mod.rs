//! Business services.
//!
//! Services return typed outcomes or their own error enums; route handlers
//! translate those into the response envelope.

pub mod auth;
pub mod events;
pub mod registration;

pub use auth::{AuthError, AuthService};
pub use events::{EventService, EventServiceError};
pub use registration::RegistrationEngine;
