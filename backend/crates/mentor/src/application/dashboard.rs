//! Mentor read model
//!
//! Cached reads for one mentor. Each list is cached under its own slot with
//! its own TTL; the dashboard is composed from a batch load of sessions,
//! mentorships and pending reviews, which is cached as well.

use kernel::id::UserId;
use platform::clock::Clock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::application::cache::{CacheSlot, MentorCache};
use crate::application::timeout::bounded;
use crate::domain::entity::analytics::{MentorAnalytics, MentorDashboard};
use crate::domain::entity::document::Document;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::repository::{
    DocumentRepository, MentorStore, MentorshipRepository, ReviewRepository, SessionRepository,
};
use crate::error::{MentorResult, StoreResult};

/// Raw data behind the dashboard, loaded in one round
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorBatch {
    pub sessions: Vec<MentoringSession>,
    pub mentorships: Vec<Mentorship>,
    pub pending_reviews: Vec<ReviewRequest>,
}

pub struct MentorReadModel<S>
where
    S: MentorStore,
{
    store: Arc<S>,
    cache: Arc<MentorCache>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl<S> Clone for MentorReadModel<S>
where
    S: MentorStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            clock: self.clock.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S> MentorReadModel<S>
where
    S: MentorStore,
{
    pub fn new(
        store: Arc<S>,
        cache: Arc<MentorCache>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            timeout,
        }
    }

    async fn cached<T, F>(
        &self,
        mentor_id: UserId,
        slot: CacheSlot,
        operation: &'static str,
        fetch: F,
    ) -> MentorResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = StoreResult<T>>,
    {
        if let Some(hit) = self.cache.get(mentor_id, slot) {
            return Ok(hit);
        }
        let generation = self.cache.generation(mentor_id);
        let fresh = bounded(self.timeout, operation, fetch).await?;
        self.cache.set_if_current(mentor_id, slot, &fresh, generation);
        Ok(fresh)
    }

    pub async fn sessions(&self, mentor_id: UserId) -> MentorResult<Vec<MentoringSession>> {
        self.cached(
            mentor_id,
            CacheSlot::Sessions,
            "sessions.list_for_mentor",
            self.store.list_sessions_for_mentor(mentor_id),
        )
        .await
    }

    pub async fn mentorships(&self, mentor_id: UserId) -> MentorResult<Vec<Mentorship>> {
        self.cached(
            mentor_id,
            CacheSlot::Mentorships,
            "mentorships.list_for_mentor",
            self.store.list_mentorships_for_mentor(mentor_id),
        )
        .await
    }

    pub async fn pending_reviews(&self, mentor_id: UserId) -> MentorResult<Vec<ReviewRequest>> {
        self.cached(
            mentor_id,
            CacheSlot::Reviews,
            "reviews.list_pending",
            self.store.list_pending_reviews_for_mentor(mentor_id),
        )
        .await
    }

    pub async fn documents(&self, mentor_id: UserId) -> MentorResult<Vec<Document>> {
        self.cached(
            mentor_id,
            CacheSlot::Documents,
            "documents.list_for_mentor",
            self.store.list_documents_for_mentor(mentor_id),
        )
        .await
    }

    pub async fn batch(&self, mentor_id: UserId) -> MentorResult<MentorBatch> {
        if let Some(hit) = self.cache.get(mentor_id, CacheSlot::Batch) {
            return Ok(hit);
        }
        let generation = self.cache.generation(mentor_id);
        let (sessions, mentorships, pending_reviews) = futures::try_join!(
            bounded(
                self.timeout,
                "sessions.list_for_mentor",
                self.store.list_sessions_for_mentor(mentor_id)
            ),
            bounded(
                self.timeout,
                "mentorships.list_for_mentor",
                self.store.list_mentorships_for_mentor(mentor_id)
            ),
            bounded(
                self.timeout,
                "reviews.list_pending",
                self.store.list_pending_reviews_for_mentor(mentor_id)
            ),
        )?;
        let batch = MentorBatch {
            sessions,
            mentorships,
            pending_reviews,
        };
        self.cache.set_if_current(mentor_id, CacheSlot::Batch, &batch, generation);
        Ok(batch)
    }

    pub async fn analytics(&self, mentor_id: UserId) -> MentorResult<MentorAnalytics> {
        if let Some(hit) = self.cache.get(mentor_id, CacheSlot::Analytics) {
            return Ok(hit);
        }
        let generation = self.cache.generation(mentor_id);
        let batch = self.batch(mentor_id).await?;
        let analytics =
            MentorAnalytics::compute(&batch.sessions, &batch.mentorships, self.clock.now());
        self.cache.set_if_current(mentor_id, CacheSlot::Analytics, &analytics, generation);
        Ok(analytics)
    }

    /// Compose (or reuse) the dashboard
    ///
    /// Takes `self` by value so the future is `'static` and can be shared by
    /// the request deduplicator.
    pub async fn dashboard(self, mentor_id: UserId) -> MentorResult<MentorDashboard> {
        if let Some(hit) = self.cache.get(mentor_id, CacheSlot::Dashboard) {
            return Ok(hit);
        }
        let generation = self.cache.generation(mentor_id);
        let batch = self.batch(mentor_id).await?;
        let dashboard = MentorDashboard::compose(
            mentor_id,
            &batch.sessions,
            batch.mentorships,
            batch.pending_reviews,
            self.clock.now(),
        );
        self.cache.set_if_current(
            mentor_id,
            CacheSlot::Analytics,
            &dashboard.analytics,
            generation,
        );
        self.cache.set_if_current(mentor_id, CacheSlot::Dashboard, &dashboard, generation);
        tracing::debug!(
            mentor_id = %mentor_id,
            upcoming = dashboard.upcoming_sessions.len(),
            pending_reviews = dashboard.pending_reviews.len(),
            "Composed dashboard"
        );
        Ok(dashboard)
    }
}
