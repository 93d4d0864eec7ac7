//! Mentor Error Types
//!
//! Domain-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Every variant is `Clone` so that a
//! deduplicated load can hand the same failure to all of its waiters.

use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::id::UserId;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_object::access::Resource;
use crate::domain::value_object::time_slot::TimeSlot;

/// Mentor-specific result type alias
pub type MentorResult<T> = Result<T, MentorError>;

/// Result type returned by every repository call
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by the persistent store or a storage collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub message: String,
    pub timed_out: bool,
    /// The write would have overlapped an active session of the same mentor
    pub overlap: bool,
}

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
            timed_out: false,
            overlap: false,
        }
    }

    pub fn timed_out(operation: &'static str, limit: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::new(
                operation,
                format!("no response within {} ms", limit.as_millis()),
            )
        }
    }

    /// Rejected write: the session's slot is already taken
    pub fn overlap(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            overlap: true,
            ..Self::new(operation, message)
        }
    }

    /// Adapter for `map_err` on sqlx calls
    ///
    /// SQLSTATE `23P01` (exclusion violation) comes from the sessions
    /// overlap constraint and is reported as an overlap.
    pub fn sqlx(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
        move |err| {
            let exclusion = err
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == EXCLUSION_VIOLATION);
            if exclusion {
                StoreError::overlap(operation, err.to_string())
            } else {
                StoreError::new(operation, err.to_string())
            }
        }
    }
}

/// Postgres `exclusion_violation`
const EXCLUSION_VIOLATION: &str = "23P01";

/// Mentor-specific error variants
#[derive(Debug, Clone, Error)]
pub enum MentorError {
    /// Bad input shape or range
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    /// No acting user could be identified for the request
    #[error("Missing actor identity")]
    MissingActor,

    #[error("Mentor {mentor_id} already has a session overlapping {start} - {end}")]
    SchedulingConflict {
        mentor_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Illegal lifecycle move
    #[error("Cannot {action} a {entity} that is {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: String,
    },

    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MentorError {
    pub fn validation(message: impl Into<String>) -> Self {
        MentorError::Validation(message.into())
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        MentorError::AccessDenied {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: Resource, id: impl Into<Uuid>) -> Self {
        MentorError::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MentorError::Validation(_) => ErrorKind::BadRequest,
            MentorError::RateLimitExceeded { .. } => ErrorKind::TooManyRequests,
            MentorError::AccessDenied { .. } => ErrorKind::Forbidden,
            MentorError::MissingActor => ErrorKind::Unauthorized,
            MentorError::SchedulingConflict { .. } | MentorError::InvalidTransition { .. } => {
                ErrorKind::Conflict
            }
            MentorError::NotFound { .. } => ErrorKind::NotFound,
            MentorError::Store(_) => ErrorKind::ServiceUnavailable,
            MentorError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, MentorError::Store(_))
    }

    /// Lift a store error into the domain, turning a rejected overlapping
    /// write into `SchedulingConflict` for `slot`
    pub fn from_session_write(err: StoreError, mentor_id: UserId, slot: &TimeSlot) -> Self {
        if err.overlap {
            return MentorError::SchedulingConflict {
                mentor_id,
                start: slot.start,
                end: slot.end,
            };
        }
        MentorError::Store(err)
    }

    /// Caller-facing rendition with an actionable hint
    ///
    /// Store failures are surfaced as a generic message; the details stay in
    /// the logs and the audit trail.
    pub fn to_app_error(&self) -> AppError {
        match self {
            MentorError::RateLimitExceeded { retry_after_secs } => {
                AppError::too_many_requests(self.to_string()).with_retry_after(*retry_after_secs)
            }
            MentorError::Validation(_) => AppError::new(self.kind(), self.to_string())
                .with_action("Correct the request and try again"),
            MentorError::MissingActor => AppError::new(self.kind(), self.to_string())
                .with_action("Send the acting user's id in the X-Actor-Id header"),
            MentorError::SchedulingConflict { .. } => AppError::new(self.kind(), self.to_string())
                .with_action("Choose a time that does not overlap an existing session"),
            MentorError::InvalidTransition { .. } => AppError::new(self.kind(), self.to_string())
                .with_action("Reload to see the current status"),
            MentorError::Store(err) if err.timed_out => {
                AppError::service_unavailable("The storage backend did not respond in time")
                    .with_action("Try again later")
            }
            MentorError::Store(_) => {
                AppError::service_unavailable("The storage backend is unavailable")
                    .with_action("Try again later")
            }
            MentorError::Internal(_) => AppError::internal("Internal error"),
            MentorError::AccessDenied { .. } | MentorError::NotFound { .. } => {
                AppError::new(self.kind(), self.to_string())
            }
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            MentorError::Store(err) => {
                tracing::error!(
                    operation = err.operation,
                    timed_out = err.timed_out,
                    error = %err.message,
                    "Mentor store error"
                );
            }
            MentorError::Internal(msg) => {
                tracing::error!(message = %msg, "Mentor internal error");
            }
            MentorError::AccessDenied { reason } => {
                tracing::warn!(reason = %reason, "Mentor access denied");
            }
            MentorError::RateLimitExceeded { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Mentor rate limit exceeded");
            }
            MentorError::SchedulingConflict { .. } | MentorError::InvalidTransition { .. } => {
                tracing::warn!(error = %self, "Mentor operation rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Mentor error");
            }
        }
    }
}

impl From<MentorError> for AppError {
    fn from(err: MentorError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for MentorError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let app = MentorError::RateLimitExceeded {
            retry_after_secs: 42,
        }
        .to_app_error();
        assert_eq!(app.kind(), ErrorKind::TooManyRequests);
        assert_eq!(app.retry_after_secs(), Some(42));
        assert_eq!(app.action(), Some("Retry after 42 seconds"));
    }

    #[test]
    fn test_store_error_is_generic_to_callers() {
        let err = MentorError::from(StoreError::new("sessions.insert", "connection reset"));
        let app = err.to_app_error();
        assert_eq!(app.kind(), ErrorKind::ServiceUnavailable);
        assert!(!app.message().contains("connection reset"));
        assert!(err.is_store_failure());
    }

    #[test]
    fn test_timeout_message() {
        let err = StoreError::timed_out("sessions.list", Duration::from_millis(250));
        assert!(err.timed_out);
        assert!(err.message.contains("250"));
        let app = MentorError::Store(err).to_app_error();
        assert!(app.message().contains("in time"));
    }

    #[test]
    fn test_overlapping_write_becomes_conflict() {
        let mentor = UserId::new();
        let start = DateTime::from_timestamp(1_780_000_000, 0).unwrap();
        let slot = TimeSlot::starting_at(start, 60).unwrap();

        let err = MentorError::from_session_write(
            StoreError::overlap("sessions.insert", "slot taken"),
            mentor,
            &slot,
        );
        assert!(matches!(
            err,
            MentorError::SchedulingConflict { mentor_id, start: s, end: e }
                if mentor_id == mentor && s == slot.start && e == slot.end
        ));
        assert_eq!(err.status_code(), 409);
        assert!(!err.is_store_failure());

        let err = MentorError::from_session_write(
            StoreError::new("sessions.insert", "connection reset"),
            mentor,
            &slot,
        );
        assert!(err.is_store_failure());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(MentorError::validation("x").kind(), ErrorKind::BadRequest);
        assert_eq!(MentorError::denied("no role").kind(), ErrorKind::Forbidden);
        assert_eq!(MentorError::MissingActor.status_code(), 401);
        assert_eq!(
            MentorError::InvalidTransition {
                entity: "session",
                from: "completed".into(),
                action: "cancel".into(),
            }
            .status_code(),
            409
        );
        assert_eq!(
            MentorError::not_found(Resource::Session, Uuid::nil()).status_code(),
            404
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = MentorError::InvalidTransition {
            entity: "session",
            from: "cancelled".into(),
            action: "start".into(),
        };
        assert_eq!(err.to_string(), "Cannot start a session that is cancelled");
    }
}
