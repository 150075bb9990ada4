//! Domain layer for the EventHub backend.
//!
//! This crate contains:
//! - Domain models (User, Event, Registration, statistics snapshots)
//! - Operation outcome types for the service boundary
//! - The pure registration decision policy

pub mod models;
pub mod services;
