//! In-Memory Store
//!
//! Implements every repository trait over `dashmap` maps. Used for
//! development and tests; it can inject failures and latency and counts
//! calls per operation.

use dashmap::DashMap;
use kernel::id::{DocumentId, MentorshipId, ReviewId, SessionId, UserId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::entity::audit_entry::AuditLogEntry;
use crate::domain::entity::document::Document;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::repository::{
    AuditSink, DocumentRepository, MentorshipRepository, ReviewRepository, RoleRepository,
    SessionRepository,
};
use crate::domain::value_object::user_role::UserRole;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    Audit,
}

#[derive(Default)]
struct Inner {
    sessions: DashMap<SessionId, MentoringSession>,
    mentorships: DashMap<MentorshipId, Mentorship>,
    documents: DashMap<DocumentId, Document>,
    reviews: DashMap<ReviewId, ReviewRequest>,
    roles: DashMap<UserId, UserRole>,
    audit: DashMap<u64, AuditLogEntry>,
    audit_seq: AtomicU64,
    /// Serializes session writes so the overlap check and the write are one step
    calendar: Mutex<()>,
    calls: DashMap<&'static str, usize>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_audit: AtomicBool,
    latency_ms: AtomicU64,
    operation_latency_ms: DashMap<&'static str, u64>,
}

/// In-memory mentor store; clones share state
#[derive(Clone, Default)]
pub struct InMemoryMentorStore {
    inner: Arc<Inner>,
}

impl InMemoryMentorStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding ----------------------------------------------------------

    pub fn add_role(&self, user_id: UserId, role: UserRole) {
        self.inner.roles.insert(user_id, role);
    }

    pub fn add_mentorship(&self, mentorship: Mentorship) {
        self.inner.mentorships.insert(mentorship.id, mentorship);
    }

    pub fn add_session(&self, session: MentoringSession) {
        self.inner.sessions.insert(session.id, session);
    }

    // -- inspection -------------------------------------------------------

    pub fn session(&self, id: SessionId) -> Option<MentoringSession> {
        self.inner.sessions.get(&id).map(|s| s.clone())
    }

    pub fn mentorship(&self, id: MentorshipId) -> Option<Mentorship> {
        self.inner.mentorships.get(&id).map(|m| m.clone())
    }

    /// Sessions of `mentor_id` that still hold their slot
    pub fn blocking_sessions(&self, mentor_id: UserId) -> usize {
        self.inner
            .sessions
            .iter()
            .filter(|s| s.mentor_id == mentor_id && s.blocks_calendar())
            .count()
    }

    /// Persisted audit entries in write order
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        let mut entries: Vec<(u64, AuditLogEntry)> = self
            .inner
            .audit
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    /// How many times `operation` reached the store
    pub fn calls(&self, operation: &str) -> usize {
        self.inner.calls.get(operation).map(|c| *c).unwrap_or(0)
    }

    // -- failure injection ------------------------------------------------

    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_audit(&self, fail: bool) {
        self.inner.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.inner
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay only `operation`, on top of any global latency
    pub fn set_operation_latency(&self, operation: &'static str, latency: Duration) {
        self.inner
            .operation_latency_ms
            .insert(operation, latency.as_millis() as u64);
    }

    async fn enter(&self, operation: &'static str, access: Access) -> StoreResult<()> {
        *self.inner.calls.entry(operation).or_insert(0) += 1;

        let latency_ms = self.inner.latency_ms.load(Ordering::SeqCst)
            + self
                .inner
                .operation_latency_ms
                .get(operation)
                .map_or(0, |ms| *ms);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }

        let failing = match access {
            Access::Read => &self.inner.fail_reads,
            Access::Write => &self.inner.fail_writes,
            Access::Audit => &self.inner.fail_audit,
        };
        if failing.load(Ordering::SeqCst) {
            return Err(StoreError::new(operation, "injected failure"));
        }
        Ok(())
    }
}

impl SessionRepository for InMemoryMentorStore {
    async fn insert_session(&self, session: &MentoringSession) -> StoreResult<()> {
        self.enter("sessions.insert", Access::Write).await?;
        self.write_session("sessions.insert", session, false)
            .await
            .map(|_| ())
    }

    async fn update_session(&self, session: &MentoringSession) -> StoreResult<MentoringSession> {
        self.enter("sessions.update", Access::Write).await?;
        self.write_session("sessions.update", session, true).await
    }

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<MentoringSession>> {
        self.enter("sessions.find", Access::Read).await?;
        Ok(self.session(id))
    }

    async fn list_sessions_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<MentoringSession>> {
        self.enter("sessions.list_for_mentor", Access::Read).await?;
        Ok(self.sessions_where(|s| s.mentor_id == mentor_id))
    }

    async fn list_active_sessions_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<MentoringSession>> {
        self.enter("sessions.list_active", Access::Read).await?;
        Ok(self.sessions_where(|s| s.mentor_id == mentor_id && s.blocks_calendar()))
    }

    async fn list_sessions_for_mentorship(
        &self,
        mentorship_id: MentorshipId,
    ) -> StoreResult<Vec<MentoringSession>> {
        self.enter("sessions.list_for_mentorship", Access::Read)
            .await?;
        Ok(self.sessions_where(|s| s.mentorship_id == mentorship_id))
    }
}

impl InMemoryMentorStore {
    /// Store `session` unless it would overlap another active session of
    /// the same mentor
    async fn write_session(
        &self,
        operation: &'static str,
        session: &MentoringSession,
        must_exist: bool,
    ) -> StoreResult<MentoringSession> {
        let _calendar = self.inner.calendar.lock().await;
        if must_exist && !self.inner.sessions.contains_key(&session.id) {
            return Err(StoreError::new(operation, "no such session"));
        }

        if session.blocks_calendar() {
            let slot = session.slot();
            let blocking = self.inner.sessions.iter().find_map(|other| {
                let clash = other.id != session.id
                    && other.mentor_id == session.mentor_id
                    && other.blocks_calendar()
                    && other.slot().overlaps(&slot);
                clash.then_some(other.id)
            });
            if let Some(blocking) = blocking {
                return Err(StoreError::overlap(
                    operation,
                    format!("overlaps active session {blocking}"),
                ));
            }
        }

        self.inner.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    fn sessions_where(&self, keep: impl Fn(&MentoringSession) -> bool) -> Vec<MentoringSession> {
        let mut sessions: Vec<MentoringSession> = self
            .inner
            .sessions
            .iter()
            .filter(|s| keep(s.value()))
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by_key(|s| s.scheduled_start);
        sessions
    }
}

impl MentorshipRepository for InMemoryMentorStore {
    async fn find_mentorship(&self, id: MentorshipId) -> StoreResult<Option<Mentorship>> {
        self.enter("mentorships.find", Access::Read).await?;
        Ok(self.mentorship(id))
    }

    async fn list_mentorships_for_mentor(&self, mentor_id: UserId) -> StoreResult<Vec<Mentorship>> {
        self.enter("mentorships.list_for_mentor", Access::Read)
            .await?;
        let mut mentorships: Vec<Mentorship> = self
            .inner
            .mentorships
            .iter()
            .filter(|m| m.mentor_id == mentor_id)
            .map(|m| m.value().clone())
            .collect();
        mentorships.sort_by_key(|m| m.started_at);
        Ok(mentorships)
    }

    async fn update_mentorship(&self, mentorship: &Mentorship) -> StoreResult<()> {
        self.enter("mentorships.update", Access::Write).await?;
        self.inner
            .mentorships
            .insert(mentorship.id, mentorship.clone());
        Ok(())
    }
}

impl DocumentRepository for InMemoryMentorStore {
    async fn insert_document(&self, document: &Document) -> StoreResult<()> {
        self.enter("documents.insert", Access::Write).await?;
        self.inner.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_document(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        self.enter("documents.find", Access::Read).await?;
        Ok(self.inner.documents.get(&id).map(|d| d.clone()))
    }

    async fn list_documents_for_mentor(&self, mentor_id: UserId) -> StoreResult<Vec<Document>> {
        self.enter("documents.list_for_mentor", Access::Read)
            .await?;
        let mut documents: Vec<Document> = self
            .inner
            .documents
            .iter()
            .filter(|d| d.mentor_id == mentor_id)
            .map(|d| d.value().clone())
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }
}

impl ReviewRepository for InMemoryMentorStore {
    async fn insert_review(&self, review: &ReviewRequest) -> StoreResult<()> {
        self.enter("reviews.insert", Access::Write).await?;
        self.inner.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn update_review(&self, review: &ReviewRequest) -> StoreResult<()> {
        self.enter("reviews.update", Access::Write).await?;
        self.inner.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_review(&self, id: ReviewId) -> StoreResult<Option<ReviewRequest>> {
        self.enter("reviews.find", Access::Read).await?;
        Ok(self.inner.reviews.get(&id).map(|r| r.clone()))
    }

    async fn list_pending_reviews_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<ReviewRequest>> {
        self.enter("reviews.list_pending", Access::Read).await?;
        let mut reviews: Vec<ReviewRequest> = self
            .inner
            .reviews
            .iter()
            .filter(|r| r.mentor_id == mentor_id && r.status.is_pending())
            .map(|r| r.value().clone())
            .collect();
        reviews.sort_by_key(|r| r.requested_at);
        Ok(reviews)
    }
}

impl RoleRepository for InMemoryMentorStore {
    async fn find_role(&self, user_id: UserId) -> StoreResult<Option<UserRole>> {
        self.enter("roles.find", Access::Read).await?;
        Ok(self.inner.roles.get(&user_id).map(|r| *r))
    }
}

impl AuditSink for InMemoryMentorStore {
    async fn append_audit(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        self.enter("audit.append", Access::Audit).await?;
        let seq = self.inner.audit_seq.fetch_add(1, Ordering::SeqCst);
        self.inner.audit.insert(seq, entry.clone());
        Ok(())
    }
}
