//! Per-entry identifiers for intake sessions.
//!
//! Every list entry the intake form creates (symptoms, images) and every session itself is
//! keyed by an [`EntryId`]. Identifiers are random v4 UUIDs rendered in a *canonical* form:
//! **32 lowercase hexadecimal characters** (no hyphens).
//!
//! Random UUIDs replace the timestamp-derived keys a browser form would typically produce,
//! which can collide when two entries are added within the same millisecond.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Identifiers supplied from outside (REST paths, CLI input) must already be canonical. Use
//! [`EntryId::parse`] to validate them.

mod service;

pub use service::{EntryId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
