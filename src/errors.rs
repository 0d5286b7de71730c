//! Unified error type for the overtime tracker.
//!
//! Domain failures (missing worklogs, overlapping sessions, insufficient balance)
//! and infrastructure failures (database, I/O, configuration) share one enum so
//! that every layer can propagate with `?`. The API layer maps variants onto
//! HTTP status codes using [`Error::code`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Worklog not found: {worklog_id}")]
    WorklogNotFound { worklog_id: i64 },

    #[error("Insufficient balance: {balance} minutes available, {required} required")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("User already has in-progress work")]
    WorklogInProgressExists,

    #[error("Work session would overlap with worklog {conflicting_id}")]
    WorklogOverlap { conflicting_id: i64 },

    #[error("Worklog {worklog_id} is already completed")]
    WorklogAlreadyCompleted { worklog_id: i64 },

    #[error("Invalid work time: {message}")]
    WorklogInvalidTime { message: String },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error, returned to API clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::WorklogNotFound { .. } => "WORKLOG_NOT_FOUND",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::WorklogInProgressExists => "WORKLOG_IN_PROGRESS_EXISTS",
            Self::WorklogOverlap { .. } => "WORKLOG_OVERLAP",
            Self::WorklogAlreadyCompleted { .. } => "WORKLOG_ALREADY_COMPLETED",
            Self::WorklogInvalidTime { .. } => "WORKLOG_INVALID_TIME",
        }
    }

    /// Whether this error comes from the infrastructure rather than from a
    /// rejected request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Database(_) | Self::Io(_))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
