//! Crate-level tests for the mentor platform pipeline
//!
//! Inline `#[cfg(test)]` modules cover single units; the groups here drive
//! `MentorPlatform` end to end against the in-memory store.

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use kernel::id::{MentorshipId, UserId};
    use platform::clock::{Clock, ManualClock};
    use std::sync::Arc;

    use crate::application::config::MentorConfig;
    use crate::application::orchestrator::{MentorPlatform, PlatformServices};
    use crate::application::scheduling::CreateSessionInput;
    use crate::domain::entity::mentorship::Mentorship;
    use crate::domain::entity::session::{MentoringSession, SessionDraft};
    use crate::domain::value_object::session_type::SessionType;
    use crate::domain::value_object::user_role::UserRole;
    use crate::infra::collaborators::{InMemoryFileStorage, RecordingNotifier};
    use crate::infra::memory::InMemoryMentorStore;

    /// Monday 2026-03-02, 08:00 UTC
    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    /// A scheduled one-hour session of `mentor` in an unrelated mentorship
    pub fn session_for(mentor_id: UserId, start: DateTime<Utc>) -> MentoringSession {
        MentoringSession::schedule(
            SessionDraft {
                mentorship_id: MentorshipId::new(),
                mentor_id,
                mentee_id: UserId::new(),
                title: "Portfolio review".into(),
                session_type: SessionType::DocumentReview,
                scheduled_start: start,
                duration_minutes: 60,
                timezone: "UTC".into(),
            },
            start - chrono::Duration::days(1),
        )
        .unwrap()
    }

    pub struct Harness {
        pub store: InMemoryMentorStore,
        pub clock: Arc<ManualClock>,
        pub notifier: Arc<RecordingNotifier>,
        pub files: Arc<InMemoryFileStorage>,
        pub platform: MentorPlatform<InMemoryMentorStore>,
        pub mentor: UserId,
        pub mentee: UserId,
        pub admin: UserId,
        pub mentorship: Mentorship,
    }

    impl Harness {
        pub fn session_input(&self, start: DateTime<Utc>, minutes: u32) -> CreateSessionInput {
            CreateSessionInput {
                mentorship_id: self.mentorship.id,
                title: "Weekly check-in".into(),
                session_type: SessionType::ProgressCheck,
                scheduled_start: start,
                duration_minutes: minutes,
                timezone: "UTC".into(),
            }
        }

        pub async fn book(&self, start: DateTime<Utc>) -> MentoringSession {
            self.platform
                .create_session(self.mentor, self.session_input(start, 60))
                .await
                .into_result()
                .unwrap()
        }

        pub fn audit_actions(&self) -> Vec<String> {
            self.store
                .audit_entries()
                .into_iter()
                .map(|e| e.action)
                .collect()
        }
    }

    pub fn harness() -> Harness {
        harness_with(MentorConfig::default())
    }

    /// Seeded mentor, mentee and admin, with one active mentorship between
    /// the first two; time stands still at [`base_time`] until moved
    pub fn harness_with(config: MentorConfig) -> Harness {
        let store = InMemoryMentorStore::new();
        let clock = Arc::new(ManualClock::new(base_time()));
        let notifier = Arc::new(RecordingNotifier::new());
        let files = Arc::new(InMemoryFileStorage::new("https://files.test"));

        let (mentor, mentee, admin) = (UserId::new(), UserId::new(), UserId::new());
        store.add_role(mentor, UserRole::Mentor);
        store.add_role(mentee, UserRole::Student);
        store.add_role(admin, UserRole::Admin);
        let mentorship = Mentorship::new(mentor, mentee, base_time());
        store.add_mentorship(mentorship.clone());

        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let services = PlatformServices::new(dyn_clock, &config);
        let platform = MentorPlatform::new(
            Arc::new(store.clone()),
            notifier.clone(),
            files.clone(),
            services,
            config,
        );

        Harness {
            store,
            clock,
            notifier,
            files,
            platform,
            mentor,
            mentee,
            admin,
            mentorship,
        }
    }
}

#[cfg(test)]
mod time_slot_tests {
    use super::fixtures::at;
    use crate::domain::value_object::time_slot::TimeSlot;

    #[test]
    fn test_overlap_is_symmetric() {
        let cases = [
            (at(10, 0), 60, at(10, 30), 60),
            (at(10, 0), 60, at(11, 0), 60),
            (at(10, 0), 120, at(10, 15), 15),
            (at(9, 0), 30, at(14, 0), 30),
        ];
        for (a_start, a_min, b_start, b_min) in cases {
            let a = TimeSlot::starting_at(a_start, a_min).unwrap();
            let b = TimeSlot::starting_at(b_start, b_min).unwrap();
            assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }

    #[test]
    fn test_back_to_back_slots_do_not_overlap() {
        let first = TimeSlot::starting_at(at(10, 0), 60).unwrap();
        let second = TimeSlot::starting_at(at(11, 0), 60).unwrap();
        assert!(!first.overlaps(&second));
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use platform::clock::{Clock, ManualClock};
    use platform::rate_limit::{RateLimitConfig, RateLimiter};
    use std::sync::Arc;
    use std::time::Duration;

    use super::fixtures::{at, harness_with};
    use crate::application::config::MentorConfig;
    use crate::domain::value_object::access::RiskLevel;
    use crate::error::MentorError;

    #[test]
    fn test_window_resets_after_expiry() {
        let clock = Arc::new(ManualClock::at_ms(1_000_000));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let limiter = RateLimiter::new(dyn_clock);
        let limit = RateLimitConfig::new(2, 60);

        assert!(limiter.check("u1", "create_session", &limit).allowed);
        assert!(limiter.check("u1", "create_session", &limit).allowed);
        let denied = limiter.check("u1", "create_session", &limit);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, Some(60));

        clock.advance(Duration::from_secs(60));
        let fresh = limiter.check("u1", "create_session", &limit);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1);
    }

    #[tokio::test]
    async fn test_violation_is_audited_and_reported() {
        let mut config = MentorConfig::default();
        config.rate_limits.create_session = RateLimitConfig::new(2, 60);
        let h = harness_with(config);

        h.book(at(9, 0)).await;
        h.book(at(10, 0)).await;
        let third = h
            .platform
            .create_session(h.mentor, h.session_input(at(11, 0), 60))
            .await;

        assert!(matches!(
            third.cause(),
            Some(MentorError::RateLimitExceeded {
                retry_after_secs: 60
            })
        ));
        let error = third.error.as_ref().unwrap();
        assert_eq!(error.retry_after_secs, Some(60));

        let entries = h.store.audit_entries();
        let violation = entries.last().unwrap();
        assert_eq!(violation.action, "rate_limit_exceeded:create_session");
        assert_eq!(violation.risk_level, RiskLevel::Medium);
        assert_eq!(violation.actor_id, h.mentor);

        h.clock.advance(Duration::from_secs(60));
        assert!(
            h.platform
                .create_session(h.mentor, h.session_input(at(11, 0), 60))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_repeat_offender_escalates_to_high() {
        let mut config = MentorConfig::default();
        config.rate_limits.read = RateLimitConfig::new(1, 60);
        config.suspicious_activity_threshold = 2;
        let h = harness_with(config);

        assert!(h.platform.get_sessions(h.mentor, h.mentor).await.is_ok());
        let first = h.platform.get_sessions(h.mentor, h.mentor).await;
        let second = h.platform.get_sessions(h.mentor, h.mentor).await;
        assert!(!first.is_ok());
        assert!(!second.is_ok());

        let risks: Vec<RiskLevel> = h
            .store
            .audit_entries()
            .into_iter()
            .filter(|e| e.action == "rate_limit_exceeded:get_sessions")
            .map(|e| e.risk_level)
            .collect();
        assert_eq!(risks, vec![RiskLevel::Medium, RiskLevel::High]);
    }
}

#[cfg(test)]
mod cache_tests {
    use kernel::id::UserId;
    use platform::clock::{Clock, ManualClock};
    use std::sync::Arc;
    use std::time::Duration;

    use super::fixtures::harness;
    use crate::application::cache::{CacheSlot, MentorCache};
    use crate::application::config::CacheTtls;
    use crate::application::documents::CreateDocumentInput;
    use crate::domain::value_object::document_access::DocumentAccess;

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = Arc::new(ManualClock::at_ms(5_000));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let ttls = CacheTtls {
            sessions: Duration::from_secs(1),
            ..CacheTtls::default()
        };
        let cache = MentorCache::new(dyn_clock, ttls);
        let mentor = UserId::new();
        cache.set(mentor, CacheSlot::Sessions, &vec![1, 2, 3]);

        clock.advance_ms(900);
        assert_eq!(
            cache.get::<Vec<i32>>(mentor, CacheSlot::Sessions),
            Some(vec![1, 2, 3])
        );

        clock.advance_ms(200);
        assert_eq!(cache.get::<Vec<i32>>(mentor, CacheSlot::Sessions), None);
    }

    fn guide(access: DocumentAccess) -> CreateDocumentInput {
        CreateDocumentInput {
            title: "Interview guide".into(),
            document_type: "guide".into(),
            url: Some("https://example.org/guide.pdf".into()),
            access,
        }
    }

    #[tokio::test]
    async fn test_create_document_invalidates_listing() {
        let h = harness();

        let before = h
            .platform
            .get_cached_documents(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert!(before.is_empty());

        let created = h
            .platform
            .create_document(h.mentor, guide(DocumentAccess::Public))
            .await
            .into_result()
            .unwrap();

        let after = h
            .platform
            .get_cached_documents(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, created.id);
        assert_eq!(h.store.calls("documents.list_for_mentor"), 2);

        // Served from cache this time
        h.platform
            .get_cached_documents(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(h.store.calls("documents.list_for_mentor"), 2);
    }

    #[tokio::test]
    async fn test_listing_respects_document_access() {
        let h = harness();
        h.platform
            .create_document(h.mentor, guide(DocumentAccess::Public))
            .await
            .into_result()
            .unwrap();
        h.platform
            .create_document(h.mentor, guide(DocumentAccess::Private))
            .await
            .into_result()
            .unwrap();
        h.platform
            .create_document(
                h.mentor,
                guide(DocumentAccess::SpecificMentees(vec![h.mentee])),
            )
            .await
            .into_result()
            .unwrap();

        let as_mentee = h
            .platform
            .get_cached_documents(h.mentee, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(as_mentee.len(), 2);

        let as_stranger = {
            let stranger = UserId::new();
            h.store
                .add_role(stranger, crate::domain::value_object::user_role::UserRole::Student);
            h.platform
                .get_cached_documents(stranger, h.mentor)
                .await
                .into_result()
                .unwrap()
        };
        assert_eq!(as_stranger.len(), 1);

        let as_admin = h
            .platform
            .get_cached_documents(h.admin, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(as_admin.len(), 3);
    }
}

#[cfg(test)]
mod dashboard_tests {
    use std::time::Duration;

    use super::fixtures::{at, harness};
    use crate::domain::value_object::access::RiskLevel;
    use crate::error::MentorError;

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_load() {
        let h = harness();
        h.book(at(10, 0)).await;
        h.platform.cache().clear();
        h.store.set_latency(Duration::from_millis(20));
        let baseline = h.store.calls("sessions.list_for_mentor");

        let (a, b) = tokio::join!(
            h.platform.fetch_dashboard(h.mentor, h.mentor),
            h.platform.fetch_dashboard(h.mentor, h.mentor),
        );
        let (a, b) = (a.into_result().unwrap(), b.into_result().unwrap());

        assert_eq!(a.upcoming_sessions.len(), 1);
        assert_eq!(a.generated_at, b.generated_at);
        assert_eq!(h.store.calls("sessions.list_for_mentor"), baseline + 1);
    }

    #[tokio::test]
    async fn test_write_during_slow_load_is_visible() {
        let h = harness();
        h.store
            .set_operation_latency("reviews.list_pending", Duration::from_millis(200));

        let early = h.platform.fetch_dashboard(h.mentor, h.mentor);
        let writer = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let booked = h.book(at(10, 0)).await;
            let seen = h
                .platform
                .fetch_dashboard(h.mentor, h.mentor)
                .await
                .into_result()
                .unwrap();
            (booked, seen)
        };
        let (early, (booked, seen)) = tokio::join!(early, writer);

        assert!(early.into_result().unwrap().upcoming_sessions.is_empty());
        assert!(seen.upcoming_sessions.iter().any(|s| s.id == booked.id));

        let later = h
            .platform
            .fetch_dashboard(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert!(later.upcoming_sessions.iter().any(|s| s.id == booked.id));
        assert_eq!(later.analytics.upcoming_sessions, 1);
    }

    #[tokio::test]
    async fn test_dashboard_of_another_mentor_is_denied() {
        let h = harness();
        let response = h.platform.fetch_dashboard(h.mentee, h.mentor).await;
        assert!(matches!(
            response.cause(),
            Some(MentorError::AccessDenied { .. })
        ));

        let entries = h.store.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "access_denied:dashboard:read");
        assert_eq!(entries[0].risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_admin_reads_any_dashboard() {
        let h = harness();
        h.book(at(10, 0)).await;
        let dashboard = h
            .platform
            .fetch_dashboard(h.admin, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(dashboard.mentor_id, h.mentor);
        assert_eq!(dashboard.analytics.upcoming_sessions, 1);
        assert_eq!(dashboard.mentorships.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_role() {
        let h = harness();
        let stranger = kernel::id::UserId::new();
        let response = h.platform.get_analytics(stranger, stranger).await;
        match response.cause() {
            Some(MentorError::AccessDenied { reason }) => assert_eq!(reason, "no role"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

#[cfg(test)]
mod scheduling_tests {
    use std::time::Duration;

    use super::fixtures::{at, harness, session_for};
    use crate::domain::value_object::access::RiskLevel;
    use crate::domain::value_object::session_status::SessionStatus;
    use crate::error::MentorError;

    #[tokio::test]
    async fn test_overlapping_booking_is_rejected() {
        let h = harness();
        h.store.add_session(session_for(h.mentor, at(10, 0)));

        let clash = h
            .platform
            .create_session(h.mentor, h.session_input(at(10, 30), 60))
            .await;
        assert!(matches!(
            clash.cause(),
            Some(MentorError::SchedulingConflict { .. })
        ));
        assert_eq!(clash.cause().unwrap().status_code(), 409);

        let adjacent = h
            .platform
            .create_session(h.mentor, h.session_input(at(11, 0), 60))
            .await
            .into_result()
            .unwrap();
        assert_eq!(adjacent.scheduled_start, at(11, 0));
        assert_eq!(adjacent.scheduled_end, at(12, 0));

        let actions = h.audit_actions();
        assert!(actions.contains(&"create_session_rejected".to_string()));
        assert!(actions.contains(&"create_session".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_bookings_admit_one() {
        let h = harness();
        h.store.set_latency(Duration::from_millis(20));

        let (a, b) = tokio::join!(
            h.platform
                .create_session(h.mentor, h.session_input(at(10, 0), 60)),
            h.platform
                .create_session(h.mentor, h.session_input(at(10, 30), 60)),
        );
        let outcomes = [a.into_result(), b.into_result()];

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|o| matches!(
            o,
            Err(MentorError::SchedulingConflict { .. })
        )));
        assert_eq!(h.store.blocking_sessions(h.mentor), 1);
    }

    #[tokio::test]
    async fn test_cancelled_session_frees_the_slot() {
        let h = harness();
        let booked = h.book(at(10, 0)).await;
        h.platform
            .cancel_session(h.mentee, booked.id, "Exam moved".into())
            .await
            .into_result()
            .unwrap();

        assert!(
            !h.platform
                .has_conflict(h.mentor, at(10, 0), 60, None)
                .await
                .unwrap()
        );
        assert!(h.book(at(10, 0)).await.blocks_calendar());
    }

    #[tokio::test]
    async fn test_student_cannot_create_session() {
        let h = harness();
        let response = h
            .platform
            .create_session(h.mentee, h.session_input(at(10, 0), 60))
            .await;

        assert!(matches!(
            response.cause(),
            Some(MentorError::AccessDenied { .. })
        ));
        assert_eq!(response.cause().unwrap().status_code(), 403);

        let entries = h.store.audit_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].action.starts_with("access_denied"));
        assert_eq!(entries[0].risk_level, RiskLevel::Medium);
        assert_eq!(entries[0].actor_id, h.mentee);
        assert_eq!(h.store.calls("sessions.insert"), 0);
    }

    #[tokio::test]
    async fn test_foreign_mentorship_is_high_risk() {
        let h = harness();
        let other = kernel::id::UserId::new();
        h.store
            .add_role(other, crate::domain::value_object::user_role::UserRole::Mentor);

        let response = h
            .platform
            .create_session(other, h.session_input(at(10, 0), 60))
            .await;
        assert!(!response.is_ok());
        let entries = h.store.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_terminal_sessions_reject_transitions() {
        let h = harness();
        let booked = h.book(at(10, 0)).await;
        h.platform
            .complete_session(h.mentor, booked.id, Default::default())
            .await
            .into_result()
            .unwrap();

        let cancel = h
            .platform
            .cancel_session(h.mentor, booked.id, "Too late".into())
            .await;
        assert!(matches!(
            cancel.cause(),
            Some(MentorError::InvalidTransition { .. })
        ));
        let start = h.platform.start_session(h.mentor, booked.id).await;
        assert!(!start.is_ok());

        assert_eq!(
            h.store.session(booked.id).unwrap().status,
            SessionStatus::Completed
        );
        assert!(
            h.audit_actions()
                .contains(&"cancel_session_rejected".to_string())
        );
    }

    #[tokio::test]
    async fn test_reschedule_into_conflict_keeps_original() {
        let h = harness();
        h.book(at(10, 0)).await;
        let later = h.book(at(13, 0)).await;

        let clash = h
            .platform
            .reschedule_session(
                h.mentor,
                crate::application::scheduling::RescheduleInput {
                    session_id: later.id,
                    new_start: at(10, 30),
                    duration_minutes: None,
                },
            )
            .await;
        assert!(matches!(
            clash.cause(),
            Some(MentorError::SchedulingConflict { .. })
        ));
        let stored = h.store.session(later.id).unwrap();
        assert_eq!(stored.scheduled_start, at(13, 0));
        assert_eq!(stored.reschedule_count, 0);

        // Moving within its own slot does not collide with itself
        let moved = h
            .platform
            .reschedule_session(
                h.mentor,
                crate::application::scheduling::RescheduleInput {
                    session_id: later.id,
                    new_start: at(13, 30),
                    duration_minutes: Some(45),
                },
            )
            .await
            .into_result()
            .unwrap();
        assert_eq!(moved.status, SessionStatus::Scheduled);
        assert_eq!(moved.reschedule_count, 1);
        assert_eq!(moved.scheduled_end, at(14, 15));
    }

    #[tokio::test]
    async fn test_completion_recomputes_progress() {
        let h = harness();
        let first = h.book(at(9, 0)).await;
        h.book(at(11, 0)).await;

        h.platform
            .start_session(h.mentor, first.id)
            .await
            .into_result()
            .unwrap();
        let done = h
            .platform
            .complete_session(
                h.mentor,
                first.id,
                crate::application::scheduling::CompleteSessionInput {
                    feedback: Some("Solid progress".into()),
                    rating: Some(5),
                    follow_up_required: true,
                },
            )
            .await
            .into_result()
            .unwrap();
        assert_eq!(done.rating, Some(5));
        assert!(done.actual_start.is_some());

        let mentorship = h.store.mentorship(h.mentorship.id).unwrap();
        assert_eq!(mentorship.progress_percentage, 50);

        let analytics = h
            .platform
            .get_analytics(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(analytics.completed_sessions, 1);
        assert_eq!(analytics.average_rating, Some(5.0));
    }
}

#[cfg(test)]
mod resilience_tests {
    use std::time::Duration;

    use super::fixtures::{at, harness, harness_with};
    use crate::application::config::MentorConfig;
    use crate::domain::ports::NotificationKind;
    use crate::domain::value_object::access::RiskLevel;
    use crate::error::MentorError;
    use kernel::error::kind::ErrorKind;

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let mut config = MentorConfig::default();
        config.store_timeout = Duration::from_millis(20);
        let h = harness_with(config);
        h.store.set_latency(Duration::from_millis(100));

        let response = h.platform.get_sessions(h.mentor, h.mentor).await;
        match response.cause() {
            Some(MentorError::Store(err)) => assert!(err.timed_out),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            response.error.as_ref().unwrap().kind,
            ErrorKind::ServiceUnavailable
        );

        // The audit write timed out as well and waits in the fallback buffer
        let buffered = h.platform.audit_logger().fallback_entries().await;
        assert_eq!(buffered.len(), 1);
        assert_eq!(buffered[0].action, "get_sessions_failed");
        assert_eq!(buffered[0].risk_level, RiskLevel::Medium);

        h.store.set_latency(Duration::ZERO);
        assert_eq!(h.platform.flush_audit_fallback().await, 1);
        assert_eq!(h.audit_actions(), vec!["get_sessions_failed".to_string()]);
    }

    #[tokio::test]
    async fn test_audit_outage_does_not_fail_the_operation() {
        let h = harness();
        h.store.fail_audit(true);

        let session = h.book(at(10, 0)).await;
        assert!(h.store.session(session.id).is_some());
        assert!(h.store.audit_entries().is_empty());

        let buffered: Vec<String> = h
            .platform
            .audit_logger()
            .fallback_entries()
            .await
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            buffered,
            vec![
                "access_granted:session:create".to_string(),
                "create_session".to_string()
            ]
        );

        // Still down: nothing delivered, nothing lost
        assert_eq!(h.platform.flush_audit_fallback().await, 0);
        assert_eq!(h.platform.audit_logger().fallback_entries().await.len(), 2);

        h.store.fail_audit(false);
        assert_eq!(h.platform.flush_audit_fallback().await, 2);
        assert_eq!(h.audit_actions(), buffered);
    }

    #[tokio::test]
    async fn test_write_failure_is_audited_as_failed() {
        let h = harness();
        h.store.fail_writes(true);

        let response = h
            .platform
            .create_session(h.mentor, h.session_input(at(10, 0), 60))
            .await;
        assert!(
            response
                .cause()
                .is_some_and(|err| err.is_store_failure())
        );
        let message = &response.error.as_ref().unwrap().message;
        assert!(!message.contains("injected"));

        let last = h.store.audit_entries().pop().unwrap();
        assert_eq!(last.action, "create_session_failed");
        assert_eq!(last.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let h = harness();
        h.notifier.fail(true);
        assert!(
            h.platform
                .create_session(h.mentor, h.session_input(at(10, 0), 60))
                .await
                .is_ok()
        );
        assert!(h.notifier.events().await.is_empty());

        h.notifier.fail(false);
        let session = h.book(at(12, 0)).await;
        let events = h.notifier.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::SessionScheduled);
        assert_eq!(events[0].subject_id, session.id.into_uuid());
        assert_eq!(events[0].recipients, vec![h.mentor, h.mentee]);
    }

    #[tokio::test]
    async fn test_purge_expired_drops_stale_state() {
        let h = harness();
        h.platform
            .get_sessions(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert!(!h.platform.cache().is_empty());

        h.clock.advance(Duration::from_secs(3600));
        let (cache_entries, windows) = h.platform.purge_expired();
        assert!(cache_entries >= 1);
        assert!(windows >= 1);
        assert!(h.platform.cache().is_empty());
    }
}

#[cfg(test)]
mod document_review_tests {
    use super::fixtures::harness;
    use crate::application::documents::{CreateDocumentInput, UploadDocumentInput};
    use crate::application::reviews::RequestReviewInput;
    use crate::domain::ports::NotificationKind;
    use crate::domain::value_object::document_access::DocumentAccess;
    use crate::domain::value_object::review_status::ReviewStatus;
    use crate::error::MentorError;

    fn upload(file_name: &str, content: &[u8]) -> UploadDocumentInput {
        UploadDocumentInput {
            title: "Motivation letter".into(),
            document_type: "letter".into(),
            file_name: file_name.into(),
            content: content.to_vec(),
            access: DocumentAccess::Private,
        }
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_record() {
        let h = harness();
        let mut input = upload("letter.pdf", b"%PDF-1.7 body");
        input.access = DocumentAccess::SpecificMentees(vec![h.mentee]);

        let document = h
            .platform
            .upload_document(h.mentor, input)
            .await
            .into_result()
            .unwrap();

        let path = format!("documents/{}/{}/letter.pdf", h.mentor, document.id);
        assert_eq!(h.files.get(&path).as_deref(), Some(&b"%PDF-1.7 body"[..]));
        assert_eq!(
            document.storage_url.as_deref(),
            Some(format!("https://files.test/{path}").as_str())
        );
        assert_eq!(document.size_bytes, 13);

        let fetched = h
            .platform
            .get_document(h.mentee, document.id)
            .await
            .into_result()
            .unwrap();
        assert_eq!(fetched.id, document.id);
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_extension() {
        let h = harness();
        let response = h
            .platform
            .upload_document(h.mentor, upload("payload.exe", b"MZ"))
            .await;
        assert!(matches!(response.cause(), Some(MentorError::Validation(_))));
        assert!(h.files.is_empty());
    }

    #[tokio::test]
    async fn test_storage_outage_fails_upload() {
        let h = harness();
        h.files.fail(true);
        let response = h
            .platform
            .upload_document(h.mentor, upload("letter.pdf", b"%PDF"))
            .await;
        assert!(response.cause().is_some_and(|e| e.is_store_failure()));
    }

    #[tokio::test]
    async fn test_review_round_trip() {
        let h = harness();
        let document = h
            .platform
            .create_document(
                h.mentor,
                CreateDocumentInput {
                    title: "CV template".into(),
                    document_type: "template".into(),
                    url: None,
                    access: DocumentAccess::Public,
                },
            )
            .await
            .into_result()
            .unwrap();

        let review = h
            .platform
            .request_review(
                h.mentee,
                RequestReviewInput {
                    document_id: document.id,
                    note: Some("Please check the summary".into()),
                },
            )
            .await
            .into_result()
            .unwrap();
        assert_eq!(review.mentor_id, h.mentor);
        assert_eq!(review.status, ReviewStatus::Pending);

        let pending = h
            .platform
            .get_pending_reviews(h.mentor, h.mentor)
            .await
            .into_result()
            .unwrap();
        assert_eq!(pending.len(), 1);

        // Only the reviewing mentor resolves
        let by_mentee = h
            .platform
            .complete_review(h.mentee, review.id, "Looks fine".into())
            .await;
        assert!(matches!(
            by_mentee.cause(),
            Some(MentorError::AccessDenied { .. })
        ));

        let done = h
            .platform
            .complete_review(h.mentor, review.id, "Tighten the intro".into())
            .await
            .into_result()
            .unwrap();
        assert_eq!(done.status, ReviewStatus::Completed);

        let again = h
            .platform
            .return_review(h.mentor, review.id, "One more pass".into())
            .await;
        assert!(matches!(
            again.cause(),
            Some(MentorError::InvalidTransition { .. })
        ));

        let kinds: Vec<NotificationKind> = h
            .notifier
            .events()
            .await
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::ReviewRequested,
                NotificationKind::ReviewCompleted
            ]
        );
    }

    #[tokio::test]
    async fn test_private_document_is_hidden_from_mentee() {
        let h = harness();
        let document = h
            .platform
            .create_document(
                h.mentor,
                CreateDocumentInput {
                    title: "Notes".into(),
                    document_type: "notes".into(),
                    url: None,
                    access: DocumentAccess::Private,
                },
            )
            .await
            .into_result()
            .unwrap();

        let read = h.platform.get_document(h.mentee, document.id).await;
        assert!(matches!(read.cause(), Some(MentorError::AccessDenied { .. })));

        let review = h
            .platform
            .request_review(
                h.mentee,
                RequestReviewInput {
                    document_id: document.id,
                    note: None,
                },
            )
            .await;
        assert!(!review.is_ok());
    }
}
