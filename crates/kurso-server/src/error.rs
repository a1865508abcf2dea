// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for kurso-server.

use kurso_core::ValidationError;
use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A payload failed pre-write validation.
    #[error("Invalid request: {field}: {message}")]
    Validation {
        /// Path of the offending field in the payload.
        field: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// Course was not found.
    #[error("Course not found: {0}")]
    CourseNotFound(i64),

    /// Section was not found under the targeted course.
    #[error("Section not found: {0}")]
    SectionNotFound(i64),

    /// Resource was not found under the targeted section.
    #[error("Resource not found: {0}")]
    ResourceNotFound(i64),

    /// A concurrent edit collided; the caller should resubmit with fresh state.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

/// Result type using the server [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// True when a sqlx error is a unique-constraint violation (SQLSTATE 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

/// True when a sqlx error is a foreign-key violation (SQLSTATE 23503).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23503")
}

/// Map a sqlx error into the server taxonomy: unique violations become
/// retryable conflicts, everything else stays a database error.
pub fn map_storage_error(err: sqlx::Error, context: &str) -> Error {
    if is_unique_violation(&err) {
        Error::Conflict(format!("{context}: concurrent edit detected, retry"))
    } else {
        Error::Database(err)
    }
}
