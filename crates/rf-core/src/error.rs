//! # ForumError
//!
//! Centralized error handling for the rusty-forum engine.
//! Every failure is caller-recoverable; nothing here is fatal.

use thiserror::Error;

/// The primary error type for all rf-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// A field constraint was violated (e.g., title too short)
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity not found (e.g., Post, Reply)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// An entity with the same ID is already stored
    #[error("duplicate id: {0} already exists")]
    DuplicateId(String),

    /// The entity is in a state that forbids the operation (e.g., editing a deleted post)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Soft delete requested on an entity that is already deleted
    #[error("already deleted: {0}")]
    AlreadyDeleted(String),

    /// Restore requested on an entity that is still active
    #[error("not deleted: {0}")]
    NotDeleted(String),

    /// The acting user does not own the entity
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The persistence collaborator failed
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ForumError {
    pub fn persistence(err: anyhow::Error) -> Self {
        ForumError::Persistence(format!("{err:#}"))
    }
}

/// A specialized Result type for rusty-forum logic.
pub type Result<T> = std::result::Result<T, ForumError>;
