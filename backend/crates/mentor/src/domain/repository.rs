//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.
//! Every call returns `StoreResult`; the use cases never see query syntax.

use kernel::id::{DocumentId, MentorshipId, ReviewId, SessionId, UserId};

use crate::domain::entity::audit_entry::AuditLogEntry;
use crate::domain::entity::document::Document;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::value_object::user_role::UserRole;
use crate::error::StoreResult;

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn insert_session(&self, session: &MentoringSession) -> StoreResult<()>;

    /// Persist a modified session and return the stored row
    async fn update_session(&self, session: &MentoringSession) -> StoreResult<MentoringSession>;

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<MentoringSession>>;

    async fn list_sessions_for_mentor(&self, mentor_id: UserId)
    -> StoreResult<Vec<MentoringSession>>;

    /// Sessions in `scheduled` or `in_progress` for the mentor
    async fn list_active_sessions_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<MentoringSession>>;

    async fn list_sessions_for_mentorship(
        &self,
        mentorship_id: MentorshipId,
    ) -> StoreResult<Vec<MentoringSession>>;
}

/// Mentorship repository trait
#[trait_variant::make(MentorshipRepository: Send)]
pub trait LocalMentorshipRepository {
    async fn find_mentorship(&self, id: MentorshipId) -> StoreResult<Option<Mentorship>>;

    async fn list_mentorships_for_mentor(&self, mentor_id: UserId) -> StoreResult<Vec<Mentorship>>;

    async fn update_mentorship(&self, mentorship: &Mentorship) -> StoreResult<()>;
}

/// Document repository trait
#[trait_variant::make(DocumentRepository: Send)]
pub trait LocalDocumentRepository {
    async fn insert_document(&self, document: &Document) -> StoreResult<()>;

    async fn find_document(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    async fn list_documents_for_mentor(&self, mentor_id: UserId) -> StoreResult<Vec<Document>>;
}

/// Review request repository trait
#[trait_variant::make(ReviewRepository: Send)]
pub trait LocalReviewRepository {
    async fn insert_review(&self, review: &ReviewRequest) -> StoreResult<()>;

    async fn update_review(&self, review: &ReviewRequest) -> StoreResult<()>;

    async fn find_review(&self, id: ReviewId) -> StoreResult<Option<ReviewRequest>>;

    async fn list_pending_reviews_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<ReviewRequest>>;
}

/// Role lookup for the access gate
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    async fn find_role(&self, user_id: UserId) -> StoreResult<Option<UserRole>>;
}

/// Append-only audit log sink
#[trait_variant::make(AuditSink: Send)]
pub trait LocalAuditSink {
    async fn append_audit(&self, entry: &AuditLogEntry) -> StoreResult<()>;
}

/// Everything the platform needs from one backing store
pub trait MentorStore:
    SessionRepository
    + MentorshipRepository
    + DocumentRepository
    + ReviewRepository
    + RoleRepository
    + AuditSink
    + Send
    + Sync
    + 'static
{
}

impl<T> MentorStore for T where
    T: SessionRepository
        + MentorshipRepository
        + DocumentRepository
        + ReviewRepository
        + RoleRepository
        + AuditSink
        + Send
        + Sync
        + 'static
{
}
