//! Shared utilities and common types for the EventHub backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Injectable clock for time-based rules
//! - JWT credential handling
//! - Password hashing with Argon2id
//! - Common validation logic
//! - Offset pagination helpers

pub mod clock;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
