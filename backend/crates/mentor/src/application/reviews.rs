//! Review Request Use Case

use kernel::id::{DocumentId, ReviewId, UserId};
use platform::clock::Clock;
use std::sync::Arc;

use crate::application::config::MentorConfig;
use crate::application::timeout::bounded;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::repository::{DocumentRepository, MentorStore, ReviewRepository};
use crate::domain::value_object::access::Resource;
use crate::error::{MentorError, MentorResult};

const MAX_TEXT_CHARS: usize = 5_000;

#[derive(Debug, Clone)]
pub struct RequestReviewInput {
    pub document_id: DocumentId,
    pub note: Option<String>,
}

impl RequestReviewInput {
    pub fn validate(&self) -> MentorResult<()> {
        match &self.note {
            Some(note) if note.chars().count() > MAX_TEXT_CHARS => {
                Err(MentorError::validation("note is too long"))
            }
            _ => Ok(()),
        }
    }
}

/// How a mentor resolves a pending review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Complete,
    ReturnForChanges,
}

pub fn validate_feedback(feedback: &str) -> MentorResult<()> {
    if feedback.trim().is_empty() {
        return Err(MentorError::validation("feedback is required"));
    }
    if feedback.chars().count() > MAX_TEXT_CHARS {
        return Err(MentorError::validation("feedback is too long"));
    }
    Ok(())
}

pub struct ReviewService<S>
where
    S: MentorStore,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: Arc<MentorConfig>,
}

impl<S> ReviewService<S>
where
    S: MentorStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: Arc<MentorConfig>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Open a review of the document, addressed to the document's mentor
    pub async fn request(
        &self,
        mentee_id: UserId,
        input: RequestReviewInput,
    ) -> MentorResult<ReviewRequest> {
        let document = bounded(
            self.config.store_timeout,
            "documents.find",
            self.store.find_document(input.document_id),
        )
        .await?
        .ok_or_else(|| MentorError::not_found(Resource::Document, input.document_id))?;

        let review = ReviewRequest::open(
            document.id,
            document.mentor_id,
            mentee_id,
            input.note,
            self.clock.now(),
        );
        bounded(
            self.config.store_timeout,
            "reviews.insert",
            self.store.insert_review(&review),
        )
        .await?;

        tracing::info!(
            review_id = %review.id,
            document_id = %document.id,
            mentor_id = %review.mentor_id,
            "Requested review"
        );
        Ok(review)
    }

    pub async fn find(&self, id: ReviewId) -> MentorResult<ReviewRequest> {
        bounded(
            self.config.store_timeout,
            "reviews.find",
            self.store.find_review(id),
        )
        .await?
        .ok_or_else(|| MentorError::not_found(Resource::Review, id))
    }

    pub async fn resolve(
        &self,
        id: ReviewId,
        verdict: ReviewVerdict,
        feedback: String,
    ) -> MentorResult<ReviewRequest> {
        let mut review = self.find(id).await?;
        let now = self.clock.now();
        match verdict {
            ReviewVerdict::Complete => review.complete(feedback, now)?,
            ReviewVerdict::ReturnForChanges => review.return_for_changes(feedback, now)?,
        }
        bounded(
            self.config.store_timeout,
            "reviews.update",
            self.store.update_review(&review),
        )
        .await?;

        tracing::info!(review_id = %id, status = %review.status, "Resolved review");
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_must_be_present_and_bounded() {
        assert!(validate_feedback("  ").is_err());
        assert!(validate_feedback(&"x".repeat(MAX_TEXT_CHARS + 1)).is_err());
        assert!(validate_feedback("Tighten the intro").is_ok());
    }

    #[test]
    fn test_note_is_optional() {
        let mut input = RequestReviewInput {
            document_id: DocumentId::new(),
            note: None,
        };
        assert!(input.validate().is_ok());
        input.note = Some("y".repeat(MAX_TEXT_CHARS + 1));
        assert!(matches!(input.validate(), Err(MentorError::Validation(_))));
    }
}
