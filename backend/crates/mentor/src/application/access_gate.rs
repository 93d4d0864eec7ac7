//! Access Control Gate
//!
//! Authorizes `(actor, resource, action, target)` against the role table and
//! record ownership. Every decision, allow or deny, writes exactly one audit
//! entry before returning:
//!
//! | Branch                    | Risk   |
//! |---------------------------|--------|
//! | actor has no role         | medium |
//! | action not in role table  | medium |
//! | target not owned by actor | high   |
//! | allowed                   | low    |
//!
//! For `Create`, the target names the parent record: the mentorship a
//! session is booked in, or the document a review is requested for.
//! Dashboard and analytics targets are the mentor's own user id.

use kernel::id::{DocumentId, MentorshipId, ReviewId, SessionId, UserId};
use platform::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::audit::AuditLogger;
use crate::application::timeout::bounded;
use crate::domain::entity::audit_entry::AuditLogEntry;
use crate::domain::repository::{
    DocumentRepository, MentorStore, MentorshipRepository, ReviewRepository, RoleRepository,
    SessionRepository,
};
use crate::domain::services::permissions::is_permitted;
use crate::domain::value_object::access::{Action, Resource, RiskLevel};
use crate::error::{MentorError, MentorResult, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied { reason: String, risk: RiskLevel },
}

impl AccessDecision {
    fn denied(reason: impl Into<String>, risk: RiskLevel) -> Self {
        AccessDecision::Denied {
            reason: reason.into(),
            risk,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

pub struct AccessGate<S>
where
    S: MentorStore,
{
    store: Arc<S>,
    audit: Arc<AuditLogger<S>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl<S> AccessGate<S>
where
    S: MentorStore,
{
    pub fn new(
        store: Arc<S>,
        audit: Arc<AuditLogger<S>>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            audit,
            clock,
            timeout,
        }
    }

    /// Decide and audit
    ///
    /// A store failure while resolving the role or the target is returned as
    /// `Err` and is not a decision; nothing is audited for it here.
    pub async fn authorize(
        &self,
        actor: UserId,
        resource: Resource,
        action: Action,
        target: Option<Uuid>,
    ) -> MentorResult<AccessDecision> {
        let decision = self.decide(actor, resource, action, target).await?;

        let denial = match &decision {
            AccessDecision::Allowed => None,
            AccessDecision::Denied { reason, risk } => Some((reason.as_str(), *risk)),
        };
        let entry = AuditLogEntry::access_decision(
            actor,
            resource,
            action,
            target,
            denial,
            self.clock.now(),
        );
        self.audit.record(entry).await;

        match &decision {
            AccessDecision::Allowed => {
                tracing::debug!(actor_id = %actor, %resource, %action, "Access granted");
            }
            AccessDecision::Denied { reason, risk } => {
                tracing::warn!(
                    actor_id = %actor,
                    %resource,
                    %action,
                    %risk,
                    reason = %reason,
                    "Access denied"
                );
            }
        }
        Ok(decision)
    }

    /// [`Self::authorize`], with a denial turned into `AccessDenied`
    pub async fn require(
        &self,
        actor: UserId,
        resource: Resource,
        action: Action,
        target: Option<Uuid>,
    ) -> MentorResult<()> {
        match self.authorize(actor, resource, action, target).await? {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied { reason, .. } => Err(MentorError::denied(reason)),
        }
    }

    /// Admins bypass document access policies when listing
    pub async fn is_admin(&self, actor: UserId) -> MentorResult<bool> {
        let role = bounded(self.timeout, "roles.find", self.store.find_role(actor)).await?;
        Ok(role.is_some_and(|r| r.is_admin()))
    }

    async fn decide(
        &self,
        actor: UserId,
        resource: Resource,
        action: Action,
        target: Option<Uuid>,
    ) -> MentorResult<AccessDecision> {
        let role = bounded(self.timeout, "roles.find", self.store.find_role(actor)).await?;
        let Some(role) = role else {
            return Ok(AccessDecision::denied("no role", RiskLevel::Medium));
        };

        if role.is_admin() {
            return Ok(AccessDecision::Allowed);
        }

        if !is_permitted(role, resource, action) {
            return Ok(AccessDecision::denied(
                format!("role {role} may not {action} {resource}"),
                RiskLevel::Medium,
            ));
        }

        let Some(target) = target else {
            return Ok(AccessDecision::Allowed);
        };

        Ok(match self.owns(actor, resource, action, target).await? {
            Some(true) => AccessDecision::Allowed,
            Some(false) => AccessDecision::denied(
                format!("actor does not own {resource} {target}"),
                RiskLevel::High,
            ),
            None => AccessDecision::denied(
                format!("{resource} {target} not found"),
                RiskLevel::Medium,
            ),
        })
    }

    /// `None` when the target record does not exist
    async fn owns(
        &self,
        actor: UserId,
        resource: Resource,
        action: Action,
        target: Uuid,
    ) -> StoreResult<Option<bool>> {
        let store = &self.store;
        let limit = self.timeout;
        Ok(match (resource, action) {
            (Resource::Session, Action::Create) => {
                let id = MentorshipId::from_uuid(target);
                bounded(limit, "mentorships.find", store.find_mentorship(id))
                    .await?
                    .map(|m| m.mentor_id == actor)
            }
            (Resource::Session, _) => {
                let id = SessionId::from_uuid(target);
                bounded(limit, "sessions.find", store.find_session(id))
                    .await?
                    .map(|s| s.is_participant(actor))
            }
            (Resource::Mentorship, _) => {
                let id = MentorshipId::from_uuid(target);
                bounded(limit, "mentorships.find", store.find_mentorship(id))
                    .await?
                    .map(|m| m.is_participant(actor))
            }
            (Resource::Document, Action::Read) => {
                let id = DocumentId::from_uuid(target);
                bounded(limit, "documents.find", store.find_document(id))
                    .await?
                    .map(|d| d.permits_read(actor))
            }
            (Resource::Document, _) => {
                let id = DocumentId::from_uuid(target);
                bounded(limit, "documents.find", store.find_document(id))
                    .await?
                    .map(|d| d.is_owner(actor))
            }
            (Resource::Review, Action::Create) => {
                let id = DocumentId::from_uuid(target);
                bounded(limit, "documents.find", store.find_document(id))
                    .await?
                    .map(|d| d.permits_read(actor))
            }
            (Resource::Review, Action::Review) => {
                let id = ReviewId::from_uuid(target);
                bounded(limit, "reviews.find", store.find_review(id))
                    .await?
                    .map(|r| r.mentor_id == actor)
            }
            (Resource::Review, _) => {
                let id = ReviewId::from_uuid(target);
                bounded(limit, "reviews.find", store.find_review(id))
                    .await?
                    .map(|r| r.is_participant(actor))
            }
            (Resource::Analytics | Resource::Dashboard, _) => {
                Some(UserId::from_uuid(target) == actor)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::mentorship::Mentorship;
    use crate::domain::value_object::user_role::UserRole;
    use crate::infra::memory::InMemoryMentorStore;
    use platform::clock::ManualClock;

    fn gate(store: &InMemoryMentorStore) -> AccessGate<InMemoryMentorStore> {
        let store = Arc::new(store.clone());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::at_ms(1_780_000_000_000));
        let timeout = Duration::from_secs(1);
        let audit = Arc::new(AuditLogger::new(store.clone(), timeout));
        AccessGate::new(store, audit, clock, timeout)
    }

    #[tokio::test]
    async fn test_every_branch_writes_one_entry() {
        let store = InMemoryMentorStore::new();
        let (mentor, mentee, other) = (UserId::new(), UserId::new(), UserId::new());
        store.add_role(mentor, UserRole::Mentor);
        store.add_role(mentee, UserRole::Student);
        store.add_role(other, UserRole::Mentor);
        let mentorship = Mentorship::new(mentor, mentee, chrono::Utc::now());
        store.add_mentorship(mentorship.clone());
        let target = Some(mentorship.id.into_uuid());
        let gate = gate(&store);

        let cases = [
            (UserId::new(), RiskLevel::Medium, false),
            (mentee, RiskLevel::Medium, false),
            (other, RiskLevel::High, false),
            (mentor, RiskLevel::Low, true),
        ];
        for (i, (actor, risk, allowed)) in cases.into_iter().enumerate() {
            let decision = gate
                .authorize(actor, Resource::Session, Action::Create, target)
                .await
                .unwrap();
            assert_eq!(decision.is_allowed(), allowed);

            let entries = store.audit_entries();
            assert_eq!(entries.len(), i + 1);
            assert_eq!(entries[i].risk_level, risk);
            assert_eq!(entries[i].resource_id, target);
        }
    }

    #[tokio::test]
    async fn test_missing_target_is_denied() {
        let store = InMemoryMentorStore::new();
        let mentor = UserId::new();
        store.add_role(mentor, UserRole::Mentor);
        let gate = gate(&store);

        let err = gate
            .require(
                mentor,
                Resource::Session,
                Action::Update,
                Some(Uuid::new_v4()),
            )
            .await
            .unwrap_err();
        match err {
            MentorError::AccessDenied { reason } => assert!(reason.contains("not found")),
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_admin_bypasses_ownership() {
        let store = InMemoryMentorStore::new();
        let admin = UserId::new();
        store.add_role(admin, UserRole::Admin);
        let gate = gate(&store);

        assert!(gate.is_admin(admin).await.unwrap());
        gate.require(
            admin,
            Resource::Analytics,
            Action::Read,
            Some(Uuid::new_v4()),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_decision() {
        let store = InMemoryMentorStore::new();
        store.fail_reads(true);
        let gate = gate(&store);

        let err = gate
            .authorize(UserId::new(), Resource::Dashboard, Action::Read, None)
            .await
            .unwrap_err();
        assert!(err.is_store_failure());
        assert!(store.audit_entries().is_empty());
    }
}
