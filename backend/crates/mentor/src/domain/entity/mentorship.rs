use chrono::{DateTime, Utc};
use kernel::id::{MentorshipId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::services::progress::progress_percentage;
use crate::domain::value_object::mentorship_status::MentorshipStatus;

/// Standing relationship between one mentor and one mentee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentorship {
    pub id: MentorshipId,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub status: MentorshipStatus,
    pub goals: Option<String>,
    /// Derived; recomputed after every completed session
    pub progress_percentage: u8,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mentorship {
    pub fn new(mentor_id: UserId, mentee_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: MentorshipId::new(),
            mentor_id,
            mentee_id,
            status: MentorshipStatus::Active,
            goals: None,
            progress_percentage: 0,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.accepts_sessions()
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.mentor_id == user || self.mentee_id == user
    }

    pub fn record_progress(&mut self, completed: usize, total: usize, now: DateTime<Utc>) {
        self.progress_percentage = progress_percentage(completed, total);
        self.updated_at = now;
    }
}
