use chrono::{DateTime, Utc};
use kernel::id::{DocumentId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::review_status::ReviewStatus;
use crate::error::{MentorError, MentorResult};

/// A mentee's request for a mentor to review a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub id: ReviewId,
    pub document_id: DocumentId,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub status: ReviewStatus,
    pub note: Option<String>,
    pub feedback: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReviewRequest {
    pub fn open(
        document_id: DocumentId,
        mentor_id: UserId,
        mentee_id: UserId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            document_id,
            mentor_id,
            mentee_id,
            status: ReviewStatus::Pending,
            note,
            feedback: None,
            requested_at: now,
            resolved_at: None,
        }
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.mentor_id == user || self.mentee_id == user
    }

    fn resolve(
        &mut self,
        status: ReviewStatus,
        action: &str,
        feedback: String,
        now: DateTime<Utc>,
    ) -> MentorResult<()> {
        if !self.status.is_pending() {
            return Err(MentorError::InvalidTransition {
                entity: "review",
                from: self.status.code().to_string(),
                action: action.to_string(),
            });
        }
        self.status = status;
        self.feedback = Some(feedback);
        self.resolved_at = Some(now);
        Ok(())
    }

    pub fn complete(&mut self, feedback: String, now: DateTime<Utc>) -> MentorResult<()> {
        self.resolve(ReviewStatus::Completed, "complete", feedback, now)
    }

    /// Send the document back to the mentee for changes
    pub fn return_for_changes(&mut self, feedback: String, now: DateTime<Utc>) -> MentorResult<()> {
        self.resolve(ReviewStatus::Returned, "return", feedback, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_final() {
        let now = Utc::now();
        let mut review =
            ReviewRequest::open(DocumentId::new(), UserId::new(), UserId::new(), None, now);
        review.complete("Looks ready".into(), now).unwrap();
        assert_eq!(review.status, ReviewStatus::Completed);
        assert_eq!(review.resolved_at, Some(now));

        let err = review.return_for_changes("late".into(), now).unwrap_err();
        assert!(matches!(err, MentorError::InvalidTransition { .. }));
        assert_eq!(review.feedback.as_deref(), Some("Looks ready"));
    }
}
