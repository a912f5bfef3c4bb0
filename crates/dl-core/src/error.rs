//! Error taxonomy for ledger operations.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::types::ValidationError;

/// Broad class of a [`LedgerError`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The driver's current state does not allow the operation. Show the
    /// message as-is; retrying will not help.
    UserState,
    /// An input was rejected. The caller should re-prompt.
    Validation,
    /// The durable write did not complete. Nothing was changed.
    Store,
}

/// Attendance transitions that the current day's state does not allow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("already clocked in on {date} at {at}")]
    AlreadyClockedIn { date: NaiveDate, at: DateTime<Utc> },

    #[error("{date} is marked as an off day")]
    CannotClockInOnOffDay { date: NaiveDate },

    #[error("not clocked in on {date}")]
    NotClockedIn { date: NaiveDate },

    #[error("already clocked out on {date} at {at}")]
    AlreadyClockedOut { date: NaiveDate, at: DateTime<Utc> },

    #[error("attendance already recorded on {date}")]
    AlreadyHasAttendance { date: NaiveDate },
}

/// The storage backend failed to complete an operation.
///
/// Backends convert their own error types into this one; the original error
/// is kept as the source.
#[derive(Debug, Error)]
#[error("ledger store failure: {message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl StoreError {
    /// Creates a store error with no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a store error wrapping a backend error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Stored data violates a record invariant.
    pub fn corrupt(what: impl std::fmt::Display) -> Self {
        Self::new(format!("corrupt record: {what}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`Ledger`](crate::Ledger) operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Attendance(_) => ErrorKind::UserState,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Returns the attendance error, if this is one.
    pub const fn as_attendance(&self) -> Option<&AttendanceError> {
        match self {
            Self::Attendance(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the validation error, if this is one.
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_error_class() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let state: LedgerError = AttendanceError::NotClockedIn { date }.into();
        assert_eq!(state.kind(), ErrorKind::UserState);

        let validation: LedgerError = ValidationError::MissingProof.into();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let store: LedgerError = StoreError::new("disk full").into();
        assert_eq!(store.kind(), ErrorKind::Store);
    }

    #[test]
    fn messages_are_user_facing() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let err: LedgerError = AttendanceError::CannotClockInOnOffDay { date }.into();
        assert_eq!(err.to_string(), "2025-03-01 is marked as an off day");

        let err: LedgerError = StoreError::corrupt("balance is not a number").into();
        assert_eq!(
            err.to_string(),
            "ledger store failure: corrupt record: balance is not a number"
        );
    }

    #[test]
    fn store_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::other("locked");
        let err = StoreError::with_source("write failed", io);
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("locked"));
    }
}
