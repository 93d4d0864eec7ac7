//! Mentor Platform Orchestrator
//!
//! Public entry point. Every operation runs the same pipeline:
//!
//! 1. rate limit per `(actor, operation)`
//! 2. validate input
//! 3. authorize through the access gate
//! 4. perform, with every store call bounded by `store_timeout`
//! 5. invalidate the mentor's cache keys (writes only)
//! 6. non-critical side effects: notifications, analytics warm-up
//! 7. audit the outcome
//!
//! Rate-limit violations and access denials are audited where they happen
//! and not again in step 7. Operations never panic or return a bare error;
//! they answer with a [`ServiceResponse`].

use kernel::id::{DocumentId, ReviewId, SessionId, UserId};
use platform::clock::Clock;
use platform::dedupe::RequestDeduplicator;
use platform::rate_limit::{RateLimitConfig, RateLimiter};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::access_gate::AccessGate;
use crate::application::audit::AuditLogger;
use crate::application::cache::MentorCache;
use crate::application::config::MentorConfig;
use crate::application::dashboard::MentorReadModel;
use crate::application::documents::{CreateDocumentInput, DocumentService, UploadDocumentInput};
use crate::application::response::ServiceResponse;
use crate::application::reviews::{
    RequestReviewInput, ReviewService, ReviewVerdict, validate_feedback,
};
use crate::application::scheduling::{
    CompleteSessionInput, CreateSessionInput, RescheduleInput, SessionScheduler,
    validate_cancel_reason,
};
use crate::domain::entity::analytics::{MentorAnalytics, MentorDashboard};
use crate::domain::entity::audit_entry::AuditLogEntry;
use crate::domain::entity::document::Document;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::ports::{FileStorage, NotificationDispatcher, NotificationEvent, NotificationKind};
use crate::domain::repository::MentorStore;
use crate::domain::value_object::access::{Action, Resource, RiskLevel};
use crate::error::{MentorError, MentorResult};

/// Process-wide services shared by every request
///
/// Built once and injected; tests build a fresh set around a manual clock.
#[derive(Clone)]
pub struct PlatformServices {
    pub clock: Arc<dyn Clock>,
    pub limiter: Arc<RateLimiter>,
    pub cache: Arc<MentorCache>,
}

impl PlatformServices {
    pub fn new(clock: Arc<dyn Clock>, config: &MentorConfig) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(clock.clone())),
            cache: Arc::new(MentorCache::new(clock.clone(), config.cache_ttls.clone())),
            clock,
        }
    }
}

/// Audit context of one operation
struct OpContext {
    actor: UserId,
    name: &'static str,
    resource: Resource,
    target: Option<Uuid>,
    /// Store the resulting entity as the entry's `after` value
    record_after: bool,
}

impl OpContext {
    fn write(actor: UserId, name: &'static str, resource: Resource, target: Option<Uuid>) -> Self {
        Self {
            actor,
            name,
            resource,
            target,
            record_after: true,
        }
    }

    fn read(actor: UserId, name: &'static str, resource: Resource, target: Option<Uuid>) -> Self {
        Self {
            record_after: false,
            ..Self::write(actor, name, resource, target)
        }
    }
}

pub struct MentorPlatform<S>
where
    S: MentorStore,
{
    config: Arc<MentorConfig>,
    services: PlatformServices,
    audit: Arc<AuditLogger<S>>,
    gate: AccessGate<S>,
    scheduler: SessionScheduler<S>,
    documents: DocumentService<S>,
    reviews: ReviewService<S>,
    reads: MentorReadModel<S>,
    dashboards: RequestDeduplicator<MentorResult<MentorDashboard>>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl<S> MentorPlatform<S>
where
    S: MentorStore,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<dyn NotificationDispatcher>,
        files: Arc<dyn FileStorage>,
        services: PlatformServices,
        config: MentorConfig,
    ) -> Self {
        let config = Arc::new(config);
        let clock = services.clock.clone();
        let audit = Arc::new(AuditLogger::new(store.clone(), config.store_timeout));
        Self {
            gate: AccessGate::new(
                store.clone(),
                audit.clone(),
                clock.clone(),
                config.store_timeout,
            ),
            scheduler: SessionScheduler::new(store.clone(), clock.clone(), config.clone()),
            documents: DocumentService::new(store.clone(), files, clock.clone(), config.clone()),
            reviews: ReviewService::new(store.clone(), clock.clone(), config.clone()),
            reads: MentorReadModel::new(
                store,
                services.cache.clone(),
                clock,
                config.store_timeout,
            ),
            dashboards: RequestDeduplicator::new(),
            audit,
            notifier,
            services,
            config,
        }
    }

    pub fn config(&self) -> &MentorConfig {
        &self.config
    }

    pub fn audit_logger(&self) -> &AuditLogger<S> {
        &self.audit
    }

    pub fn cache(&self) -> &MentorCache {
        &self.services.cache
    }

    /// Overlap check for a prospective booking
    pub async fn has_conflict(
        &self,
        mentor_id: UserId,
        start: chrono::DateTime<chrono::Utc>,
        duration_minutes: u32,
        exclude: Option<SessionId>,
    ) -> MentorResult<bool> {
        self.scheduler
            .has_conflict(mentor_id, start, duration_minutes, exclude)
            .await
    }

    // ---------------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------------

    pub async fn create_session(
        &self,
        actor: UserId,
        input: CreateSessionInput,
    ) -> ServiceResponse<MentoringSession> {
        let target = Some(input.mentorship_id.into_uuid());
        let ctx = OpContext::write(actor, "create_session", Resource::Session, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.create_session)
                .await?;
            input.validate(&self.config, self.services.clock.now())?;
            self.gate
                .require(actor, Resource::Session, Action::Create, target)
                .await?;
            let session = self.scheduler.create(input).await?;
            self.after_write(session.mentor_id).await;
            self.notify_session(NotificationKind::SessionScheduled, &session)
                .await;
            Ok::<_, MentorError>(session)
        }
        .await;
        self.conclude(ctx, result, |s| Some(s.id.into_uuid())).await
    }

    pub async fn reschedule_session(
        &self,
        actor: UserId,
        input: RescheduleInput,
    ) -> ServiceResponse<MentoringSession> {
        let target = Some(input.session_id.into_uuid());
        let ctx = OpContext::write(actor, "reschedule_session", Resource::Session, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.lifecycle)
                .await?;
            input.validate(&self.config, self.services.clock.now())?;
            self.gate
                .require(actor, Resource::Session, Action::Update, target)
                .await?;
            let session = self.scheduler.reschedule(input).await?;
            self.after_write(session.mentor_id).await;
            self.notify_session(NotificationKind::SessionRescheduled, &session)
                .await;
            Ok::<_, MentorError>(session)
        }
        .await;
        self.conclude(ctx, result, |s| Some(s.id.into_uuid())).await
    }

    pub async fn start_session(
        &self,
        actor: UserId,
        session_id: SessionId,
    ) -> ServiceResponse<MentoringSession> {
        let target = Some(session_id.into_uuid());
        let ctx = OpContext::write(actor, "start_session", Resource::Session, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.lifecycle)
                .await?;
            self.gate
                .require(actor, Resource::Session, Action::Update, target)
                .await?;
            let session = self.scheduler.start(session_id).await?;
            self.after_write(session.mentor_id).await;
            Ok::<_, MentorError>(session)
        }
        .await;
        self.conclude(ctx, result, |s| Some(s.id.into_uuid())).await
    }

    pub async fn complete_session(
        &self,
        actor: UserId,
        session_id: SessionId,
        input: CompleteSessionInput,
    ) -> ServiceResponse<MentoringSession> {
        let target = Some(session_id.into_uuid());
        let ctx = OpContext::write(actor, "complete_session", Resource::Session, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.lifecycle)
                .await?;
            input.validate()?;
            self.gate
                .require(actor, Resource::Session, Action::Update, target)
                .await?;
            let session = self.scheduler.complete(session_id, input).await?;
            self.after_write(session.mentor_id).await;
            Ok::<_, MentorError>(session)
        }
        .await;
        self.conclude(ctx, result, |s| Some(s.id.into_uuid())).await
    }

    pub async fn cancel_session(
        &self,
        actor: UserId,
        session_id: SessionId,
        reason: String,
    ) -> ServiceResponse<MentoringSession> {
        let target = Some(session_id.into_uuid());
        let ctx = OpContext::write(actor, "cancel_session", Resource::Session, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.lifecycle)
                .await?;
            validate_cancel_reason(&reason)?;
            self.gate
                .require(actor, Resource::Session, Action::Cancel, target)
                .await?;
            let session = self
                .scheduler
                .cancel(session_id, reason.trim().to_string())
                .await?;
            self.after_write(session.mentor_id).await;
            self.notify_session(NotificationKind::SessionCancelled, &session)
                .await;
            Ok::<_, MentorError>(session)
        }
        .await;
        self.conclude(ctx, result, |s| Some(s.id.into_uuid())).await
    }

    pub async fn mark_no_show(
        &self,
        actor: UserId,
        session_id: SessionId,
    ) -> ServiceResponse<MentoringSession> {
        let target = Some(session_id.into_uuid());
        let ctx = OpContext::write(actor, "mark_no_show", Resource::Session, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.lifecycle)
                .await?;
            self.gate
                .require(actor, Resource::Session, Action::Update, target)
                .await?;
            let session = self.scheduler.mark_no_show(session_id).await?;
            self.after_write(session.mentor_id).await;
            Ok::<_, MentorError>(session)
        }
        .await;
        self.conclude(ctx, result, |s| Some(s.id.into_uuid())).await
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    pub async fn upload_document(
        &self,
        actor: UserId,
        input: UploadDocumentInput,
    ) -> ServiceResponse<Document> {
        let ctx = OpContext::write(actor, "upload_document", Resource::Document, None);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.upload_document)
                .await?;
            input.validate(&self.config)?;
            self.gate
                .require(actor, Resource::Document, Action::Create, None)
                .await?;
            let document = self.documents.upload(actor, input).await?;
            self.after_write(document.mentor_id).await;
            Ok::<_, MentorError>(document)
        }
        .await;
        self.conclude(ctx, result, |d| Some(d.id.into_uuid())).await
    }

    pub async fn create_document(
        &self,
        actor: UserId,
        input: CreateDocumentInput,
    ) -> ServiceResponse<Document> {
        let ctx = OpContext::write(actor, "create_document", Resource::Document, None);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.create_document)
                .await?;
            input.validate(&self.config)?;
            self.gate
                .require(actor, Resource::Document, Action::Create, None)
                .await?;
            let document = self.documents.create(actor, input).await?;
            self.after_write(document.mentor_id).await;
            Ok::<_, MentorError>(document)
        }
        .await;
        self.conclude(ctx, result, |d| Some(d.id.into_uuid())).await
    }

    /// The mentor's documents the actor may read, served from cache when fresh
    pub async fn get_cached_documents(
        &self,
        actor: UserId,
        mentor_id: UserId,
    ) -> ServiceResponse<Vec<Document>> {
        let ctx = OpContext::read(
            actor,
            "get_cached_documents",
            Resource::Document,
            Some(mentor_id.into_uuid()),
        );
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.read).await?;
            self.gate
                .require(actor, Resource::Document, Action::Read, None)
                .await?;
            let documents = self.reads.documents(mentor_id).await?;
            if self.gate.is_admin(actor).await? {
                return Ok(documents);
            }
            Ok::<_, MentorError>(
                documents
                    .into_iter()
                    .filter(|d| d.permits_read(actor))
                    .collect::<Vec<_>>(),
            )
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    pub async fn get_document(
        &self,
        actor: UserId,
        document_id: DocumentId,
    ) -> ServiceResponse<Document> {
        let target = Some(document_id.into_uuid());
        let ctx = OpContext::read(actor, "get_document", Resource::Document, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.read).await?;
            self.gate
                .require(actor, Resource::Document, Action::Read, target)
                .await?;
            self.documents.get(document_id).await
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    // ---------------------------------------------------------------------
    // Reviews
    // ---------------------------------------------------------------------

    pub async fn request_review(
        &self,
        actor: UserId,
        input: RequestReviewInput,
    ) -> ServiceResponse<ReviewRequest> {
        let target = Some(input.document_id.into_uuid());
        let ctx = OpContext::write(actor, "request_review", Resource::Review, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.review).await?;
            input.validate()?;
            self.gate
                .require(actor, Resource::Review, Action::Create, target)
                .await?;
            let review = self.reviews.request(actor, input).await?;
            self.after_write(review.mentor_id).await;
            self.notify(
                NotificationKind::ReviewRequested,
                vec![review.mentor_id],
                review.id.into_uuid(),
            )
            .await;
            Ok::<_, MentorError>(review)
        }
        .await;
        self.conclude(ctx, result, |r| Some(r.id.into_uuid())).await
    }

    pub async fn complete_review(
        &self,
        actor: UserId,
        review_id: ReviewId,
        feedback: String,
    ) -> ServiceResponse<ReviewRequest> {
        self.resolve_review(actor, review_id, ReviewVerdict::Complete, feedback)
            .await
    }

    pub async fn return_review(
        &self,
        actor: UserId,
        review_id: ReviewId,
        feedback: String,
    ) -> ServiceResponse<ReviewRequest> {
        self.resolve_review(actor, review_id, ReviewVerdict::ReturnForChanges, feedback)
            .await
    }

    async fn resolve_review(
        &self,
        actor: UserId,
        review_id: ReviewId,
        verdict: ReviewVerdict,
        feedback: String,
    ) -> ServiceResponse<ReviewRequest> {
        let (name, kind) = match verdict {
            ReviewVerdict::Complete => ("complete_review", NotificationKind::ReviewCompleted),
            ReviewVerdict::ReturnForChanges => ("return_review", NotificationKind::ReviewReturned),
        };
        let target = Some(review_id.into_uuid());
        let ctx = OpContext::write(actor, name, Resource::Review, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.review).await?;
            validate_feedback(&feedback)?;
            self.gate
                .require(actor, Resource::Review, Action::Review, target)
                .await?;
            let review = self
                .reviews
                .resolve(review_id, verdict, feedback.trim().to_string())
                .await?;
            self.after_write(review.mentor_id).await;
            self.notify(kind, vec![review.mentee_id], review.id.into_uuid())
                .await;
            Ok::<_, MentorError>(review)
        }
        .await;
        self.conclude(ctx, result, |r| Some(r.id.into_uuid())).await
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Cache, then a deduplicated batch load shared by concurrent callers
    pub async fn fetch_dashboard(
        &self,
        actor: UserId,
        mentor_id: UserId,
    ) -> ServiceResponse<MentorDashboard> {
        let target = Some(mentor_id.into_uuid());
        let ctx = OpContext::read(actor, "fetch_dashboard", Resource::Dashboard, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.fetch_dashboard)
                .await?;
            self.gate
                .require(actor, Resource::Dashboard, Action::Read, target)
                .await?;
            let reads = self.reads.clone();
            self.dashboards
                .dedupe(&dashboard_key(mentor_id), move || {
                    reads.dashboard(mentor_id)
                })
                .await
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    pub async fn get_sessions(
        &self,
        actor: UserId,
        mentor_id: UserId,
    ) -> ServiceResponse<Vec<MentoringSession>> {
        let ctx = self.panel_context(actor, "get_sessions", mentor_id);
        let result = async {
            self.authorize_panel(&ctx, mentor_id).await?;
            self.reads.sessions(mentor_id).await
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    pub async fn get_mentorships(
        &self,
        actor: UserId,
        mentor_id: UserId,
    ) -> ServiceResponse<Vec<Mentorship>> {
        let ctx = self.panel_context(actor, "get_mentorships", mentor_id);
        let result = async {
            self.authorize_panel(&ctx, mentor_id).await?;
            self.reads.mentorships(mentor_id).await
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    pub async fn get_pending_reviews(
        &self,
        actor: UserId,
        mentor_id: UserId,
    ) -> ServiceResponse<Vec<ReviewRequest>> {
        let ctx = self.panel_context(actor, "get_pending_reviews", mentor_id);
        let result = async {
            self.authorize_panel(&ctx, mentor_id).await?;
            self.reads.pending_reviews(mentor_id).await
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    pub async fn get_analytics(
        &self,
        actor: UserId,
        mentor_id: UserId,
    ) -> ServiceResponse<MentorAnalytics> {
        let target = Some(mentor_id.into_uuid());
        let ctx = OpContext::read(actor, "get_analytics", Resource::Analytics, target);
        let result = async {
            self.throttle(&ctx, &self.config.rate_limits.read).await?;
            self.gate
                .require(actor, Resource::Analytics, Action::Read, target)
                .await?;
            self.reads.analytics(mentor_id).await
        }
        .await;
        self.conclude(ctx, result, |_| None).await
    }

    // ---------------------------------------------------------------------
    // Housekeeping
    // ---------------------------------------------------------------------

    /// Drop expired cache entries and rate-limit windows
    pub fn purge_expired(&self) -> (usize, usize) {
        (
            self.services.cache.purge_expired(),
            self.services.limiter.purge_expired(),
        )
    }

    pub async fn flush_audit_fallback(&self) -> usize {
        self.audit.flush_fallback().await
    }

    // ---------------------------------------------------------------------
    // Pipeline steps
    // ---------------------------------------------------------------------

    /// Dashboard panels are authorized as dashboard reads of that mentor
    fn panel_context(&self, actor: UserId, name: &'static str, mentor_id: UserId) -> OpContext {
        OpContext::read(actor, name, Resource::Dashboard, Some(mentor_id.into_uuid()))
    }

    async fn authorize_panel(&self, ctx: &OpContext, mentor_id: UserId) -> MentorResult<()> {
        self.throttle(ctx, &self.config.rate_limits.read).await?;
        self.gate
            .require(
                ctx.actor,
                Resource::Dashboard,
                Action::Read,
                Some(mentor_id.into_uuid()),
            )
            .await
    }

    async fn throttle(&self, ctx: &OpContext, limit: &RateLimitConfig) -> MentorResult<()> {
        let actor_key = ctx.actor.to_string();
        let check = self.services.limiter.check(&actor_key, ctx.name, limit);
        if check.allowed {
            return Ok(());
        }

        let retry_after_secs = check.retry_after_secs.unwrap_or(1);
        let violations = self.services.limiter.suspicious_count(&actor_key);
        let risk = if violations >= self.config.suspicious_activity_threshold {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
        let mut entry = AuditLogEntry::new(
            ctx.actor,
            format!("rate_limit_exceeded:{}", ctx.name),
            ctx.resource,
            risk,
            self.services.clock.now(),
        )
        .with_reason(format!(
            "retry after {retry_after_secs}s, {violations} violations so far"
        ));
        entry.resource_id = ctx.target;
        self.audit.record(entry).await;

        Err(MentorError::RateLimitExceeded { retry_after_secs })
    }

    /// Drop the mentor's cached views, then warm analytics
    async fn after_write(&self, mentor_id: UserId) {
        self.services.cache.invalidate_mentor(mentor_id);
        self.dashboards.forget(&dashboard_key(mentor_id));
        if !self.config.warm_analytics_on_write {
            return;
        }
        if let Err(err) = self.reads.analytics(mentor_id).await {
            tracing::warn!(mentor_id = %mentor_id, error = %err, "Analytics warm-up failed");
        }
    }

    async fn notify_session(&self, kind: NotificationKind, session: &MentoringSession) {
        self.notify(
            kind,
            vec![session.mentor_id, session.mentee_id],
            session.id.into_uuid(),
        )
        .await;
    }

    /// Fire a notification; failures are logged and swallowed
    async fn notify(&self, kind: NotificationKind, recipients: Vec<UserId>, subject_id: Uuid) {
        let event = NotificationEvent {
            kind,
            recipients,
            subject_id,
            occurred_at: self.services.clock.now(),
        };
        let sent = tokio::time::timeout(
            self.config.collaborator_timeout,
            self.notifier.dispatch(&event),
        )
        .await;
        match sent {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(%kind, subject_id = %subject_id, error = %err, "Notification failed");
            }
            Err(_) => {
                tracing::warn!(%kind, subject_id = %subject_id, "Notification timed out");
            }
        }
    }

    /// Audit the outcome and wrap it in the response envelope
    async fn conclude<T>(
        &self,
        ctx: OpContext,
        result: MentorResult<T>,
        subject: impl FnOnce(&T) -> Option<Uuid>,
    ) -> ServiceResponse<T>
    where
        T: serde::Serialize,
    {
        let now = self.services.clock.now();
        let entry = match &result {
            Ok(data) => {
                let after = ctx
                    .record_after
                    .then(|| serde_json::to_value(data).ok())
                    .flatten();
                let mut entry =
                    AuditLogEntry::new(ctx.actor, ctx.name, ctx.resource, RiskLevel::Low, now)
                        .with_change(None, after);
                entry.resource_id = subject(data).or(ctx.target);
                Some(entry)
            }
            Err(MentorError::AccessDenied { .. } | MentorError::RateLimitExceeded { .. }) => None,
            Err(err) => {
                let (suffix, risk) = if err.is_store_failure() {
                    ("failed", RiskLevel::Medium)
                } else {
                    ("rejected", RiskLevel::Low)
                };
                let mut entry = AuditLogEntry::new(
                    ctx.actor,
                    format!("{}_{suffix}", ctx.name),
                    ctx.resource,
                    risk,
                    now,
                )
                .with_reason(err.to_string());
                entry.resource_id = ctx.target;
                Some(entry)
            }
        };
        if let Some(entry) = entry {
            self.audit.record(entry).await;
        }
        if let Err(err) = &result {
            err.log();
        }
        result.into()
    }
}

fn dashboard_key(mentor_id: UserId) -> String {
    format!("dashboard:{mentor_id}")
}
