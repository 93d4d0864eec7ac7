//! External collaborator ports
//!
//! Notification delivery and file storage live outside this crate. Both
//! ports are object safe so the platform can hold them as `Arc<dyn _>`.

use chrono::{DateTime, Utc};
use derive_more::Display;
use futures::future::BoxFuture;
use kernel::id::UserId;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[display("session_scheduled")]
    SessionScheduled,
    #[display("session_rescheduled")]
    SessionRescheduled,
    #[display("session_cancelled")]
    SessionCancelled,
    #[display("review_requested")]
    ReviewRequested,
    #[display("review_completed")]
    ReviewCompleted,
    #[display("review_returned")]
    ReviewReturned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub recipients: Vec<UserId>,
    /// Session or review the event is about
    pub subject_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

pub trait NotificationDispatcher: Send + Sync {
    fn dispatch<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> BoxFuture<'a, Result<(), NotificationError>>;
}

#[derive(Debug, Clone, Error)]
#[error("file storage failed: {0}")]
pub struct FileStorageError(pub String);

pub trait FileStorage: Send + Sync {
    /// Store `content` under `path` and return its URL
    fn put<'a>(
        &'a self,
        path: &'a str,
        content: &'a [u8],
    ) -> BoxFuture<'a, Result<String, FileStorageError>>;
}
