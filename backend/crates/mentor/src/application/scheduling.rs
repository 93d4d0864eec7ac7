//! Scheduling and Session Lifecycle Use Case
//!
//! Conflict detection plus every lifecycle move of a mentoring session.
//! Transitions are applied tentatively through [`Optimistic`], persisted,
//! then reconciled with the stored row or rolled back.

use chrono::{DateTime, Utc};
use kernel::id::{MentorshipId, SessionId, UserId};
use platform::clock::Clock;
use platform::optimistic::Optimistic;
use std::sync::Arc;

use crate::application::config::MentorConfig;
use crate::application::timeout::bounded;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::session::{Completion, MAX_RATING, MentoringSession, SessionDraft};
use crate::domain::repository::{MentorStore, MentorshipRepository, SessionRepository};
use crate::domain::services::conflict::find_conflict;
use crate::domain::value_object::access::Resource;
use crate::domain::value_object::session_status::SessionStatus;
use crate::domain::value_object::session_type::SessionType;
use crate::domain::value_object::time_slot::TimeSlot;
use crate::error::{MentorError, MentorResult};

/// Input DTO for booking a session
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub mentorship_id: MentorshipId,
    pub title: String,
    pub session_type: SessionType,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub timezone: String,
}

impl CreateSessionInput {
    pub fn validate(&self, config: &MentorConfig, now: DateTime<Utc>) -> MentorResult<()> {
        validate_title(&self.title, config)?;
        validate_duration(self.duration_minutes, config)?;
        validate_start(self.scheduled_start, config, now)?;
        if self.timezone.trim().is_empty() {
            return Err(MentorError::validation("timezone is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RescheduleInput {
    pub session_id: SessionId,
    pub new_start: DateTime<Utc>,
    /// Keeps the current duration when absent
    pub duration_minutes: Option<u32>,
}

impl RescheduleInput {
    pub fn validate(&self, config: &MentorConfig, now: DateTime<Utc>) -> MentorResult<()> {
        if let Some(minutes) = self.duration_minutes {
            validate_duration(minutes, config)?;
        }
        validate_start(self.new_start, config, now)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompleteSessionInput {
    pub feedback: Option<String>,
    pub rating: Option<u8>,
    pub follow_up_required: bool,
}

impl CompleteSessionInput {
    pub fn validate(&self) -> MentorResult<()> {
        match self.rating {
            Some(rating) if rating > MAX_RATING => Err(MentorError::validation(format!(
                "rating must be between 0 and {MAX_RATING}"
            ))),
            _ => Ok(()),
        }
    }
}

pub fn validate_cancel_reason(reason: &str) -> MentorResult<()> {
    if reason.trim().is_empty() {
        return Err(MentorError::validation("a cancellation reason is required"));
    }
    Ok(())
}

fn validate_title(title: &str, config: &MentorConfig) -> MentorResult<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(MentorError::validation("title is required"));
    }
    if title.chars().count() > config.max_title_chars {
        return Err(MentorError::validation(format!(
            "title must be at most {} characters",
            config.max_title_chars
        )));
    }
    Ok(())
}

fn validate_duration(duration_minutes: u32, config: &MentorConfig) -> MentorResult<()> {
    if !(config.min_session_minutes..=config.max_session_minutes).contains(&duration_minutes) {
        return Err(MentorError::validation(format!(
            "duration must be between {} and {} minutes",
            config.min_session_minutes, config.max_session_minutes
        )));
    }
    Ok(())
}

fn validate_start(
    start: DateTime<Utc>,
    config: &MentorConfig,
    now: DateTime<Utc>,
) -> MentorResult<()> {
    if start < now {
        return Err(MentorError::validation("sessions cannot start in the past"));
    }
    if start > config.booking_horizon(now) {
        return Err(MentorError::validation(format!(
            "sessions can be booked at most {} days ahead",
            config.booking_horizon_days
        )));
    }
    Ok(())
}

/// Session scheduling use case
pub struct SessionScheduler<S>
where
    S: MentorStore,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: Arc<MentorConfig>,
}

impl<S> SessionScheduler<S>
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

    /// Whether `[start, start + duration)` overlaps an active session of the mentor
    ///
    /// Fails closed: a store error is returned rather than reported as "free".
    pub async fn has_conflict(
        &self,
        mentor_id: UserId,
        start: DateTime<Utc>,
        duration_minutes: u32,
        exclude: Option<SessionId>,
    ) -> MentorResult<bool> {
        let slot = TimeSlot::starting_at(start, duration_minutes)?;
        Ok(self.conflicting(mentor_id, &slot, exclude).await?.is_some())
    }

    async fn conflicting(
        &self,
        mentor_id: UserId,
        slot: &TimeSlot,
        exclude: Option<SessionId>,
    ) -> MentorResult<Option<SessionId>> {
        let existing = bounded(
            self.config.store_timeout,
            "sessions.list_active",
            self.store.list_active_sessions_for_mentor(mentor_id),
        )
        .await?;
        Ok(find_conflict(&existing, slot, exclude).map(|s| s.id))
    }

    async fn ensure_free(
        &self,
        mentor_id: UserId,
        slot: TimeSlot,
        exclude: Option<SessionId>,
    ) -> MentorResult<()> {
        if let Some(blocking) = self.conflicting(mentor_id, &slot, exclude).await? {
            tracing::warn!(
                mentor_id = %mentor_id,
                blocking_session = %blocking,
                start = %slot.start,
                end = %slot.end,
                "Scheduling conflict"
            );
            return Err(MentorError::SchedulingConflict {
                mentor_id,
                start: slot.start,
                end: slot.end,
            });
        }
        Ok(())
    }

    pub async fn load_session(&self, id: SessionId) -> MentorResult<MentoringSession> {
        bounded(
            self.config.store_timeout,
            "sessions.find",
            self.store.find_session(id),
        )
        .await?
        .ok_or_else(|| MentorError::not_found(Resource::Session, id))
    }

    async fn load_mentorship(&self, id: MentorshipId) -> MentorResult<Mentorship> {
        bounded(
            self.config.store_timeout,
            "mentorships.find",
            self.store.find_mentorship(id),
        )
        .await?
        .ok_or_else(|| MentorError::not_found(Resource::Mentorship, id))
    }

    pub async fn create(&self, input: CreateSessionInput) -> MentorResult<MentoringSession> {
        let mentorship = self.load_mentorship(input.mentorship_id).await?;
        if !mentorship.is_active() {
            return Err(MentorError::validation(format!(
                "mentorship is {}, sessions can only be booked in an active mentorship",
                mentorship.status
            )));
        }

        let slot = TimeSlot::starting_at(input.scheduled_start, input.duration_minutes)?;
        self.ensure_free(mentorship.mentor_id, slot, None).await?;

        let session = MentoringSession::schedule(
            SessionDraft {
                mentorship_id: mentorship.id,
                mentor_id: mentorship.mentor_id,
                mentee_id: mentorship.mentee_id,
                title: input.title.trim().to_string(),
                session_type: input.session_type,
                scheduled_start: input.scheduled_start,
                duration_minutes: input.duration_minutes,
                timezone: input.timezone,
            },
            self.clock.now(),
        )?;
        bounded(
            self.config.store_timeout,
            "sessions.insert",
            self.store.insert_session(&session),
        )
        .await
        .map_err(|err| MentorError::from_session_write(err, session.mentor_id, &slot))?;

        tracing::info!(
            session_id = %session.id,
            mentor_id = %session.mentor_id,
            start = %session.scheduled_start,
            "Scheduled session"
        );
        Ok(session)
    }

    pub async fn reschedule(&self, input: RescheduleInput) -> MentorResult<MentoringSession> {
        let session = self.load_session(input.session_id).await?;
        let minutes = input.duration_minutes.unwrap_or(session.duration_minutes);
        let now = self.clock.now();

        let mut state = Optimistic::new(session);
        let tentative = state.apply(|s| s.reschedule(input.new_start, minutes, now))?;
        let (mentor_id, slot) = (tentative.mentor_id, tentative.slot());

        if let Err(err) = self.ensure_free(mentor_id, slot, Some(input.session_id)).await {
            state.rollback();
            return Err(err);
        }
        let stored = self.persist(state).await?;
        tracing::info!(
            session_id = %stored.id,
            start = %stored.scheduled_start,
            reschedule_count = stored.reschedule_count,
            "Rescheduled session"
        );
        Ok(stored)
    }

    pub async fn start(&self, id: SessionId) -> MentorResult<MentoringSession> {
        let stored = self.transition(id, |s, now| s.start(now)).await?;
        tracing::info!(session_id = %id, "Started session");
        Ok(stored)
    }

    /// Complete the session, then refresh the mentorship's progress
    ///
    /// A failed progress refresh is logged only; the next completion
    /// recomputes it from scratch.
    pub async fn complete(
        &self,
        id: SessionId,
        input: CompleteSessionInput,
    ) -> MentorResult<MentoringSession> {
        let completion = Completion {
            feedback: input.feedback,
            rating: input.rating,
            follow_up_required: input.follow_up_required,
        };
        let stored = self
            .transition(id, move |s, now| s.complete(completion, now))
            .await?;
        tracing::info!(session_id = %id, rating = ?stored.rating, "Completed session");

        if let Err(err) = self.refresh_progress(stored.mentorship_id).await {
            tracing::error!(
                mentorship_id = %stored.mentorship_id,
                error = %err,
                "Failed to recompute mentorship progress"
            );
        }
        Ok(stored)
    }

    pub async fn cancel(&self, id: SessionId, reason: String) -> MentorResult<MentoringSession> {
        let stored = self
            .transition(id, move |s, now| s.cancel(reason, now))
            .await?;
        tracing::info!(
            session_id = %id,
            reason = stored.cancellation_reason.as_deref().unwrap_or_default(),
            "Cancelled session"
        );
        Ok(stored)
    }

    pub async fn mark_no_show(&self, id: SessionId) -> MentorResult<MentoringSession> {
        let stored = self.transition(id, |s, now| s.mark_no_show(now)).await?;
        tracing::info!(session_id = %id, "Marked session as no-show");
        Ok(stored)
    }

    /// Progress = completed / all sessions of the mentorship, in percent
    pub async fn refresh_progress(&self, mentorship_id: MentorshipId) -> MentorResult<Mentorship> {
        let sessions = bounded(
            self.config.store_timeout,
            "sessions.list_for_mentorship",
            self.store.list_sessions_for_mentorship(mentorship_id),
        )
        .await?;
        let completed = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count();

        let mut mentorship = self.load_mentorship(mentorship_id).await?;
        mentorship.record_progress(completed, sessions.len(), self.clock.now());
        bounded(
            self.config.store_timeout,
            "mentorships.update",
            self.store.update_mentorship(&mentorship),
        )
        .await?;

        tracing::info!(
            mentorship_id = %mentorship_id,
            progress = mentorship.progress_percentage,
            "Updated mentorship progress"
        );
        Ok(mentorship)
    }

    async fn transition<F>(&self, id: SessionId, apply: F) -> MentorResult<MentoringSession>
    where
        F: FnOnce(&mut MentoringSession, DateTime<Utc>) -> MentorResult<()>,
    {
        let session = self.load_session(id).await?;
        let now = self.clock.now();
        let mut state = Optimistic::new(session);
        state.apply(|s| apply(s, now))?;
        self.persist(state).await
    }

    async fn persist(
        &self,
        mut state: Optimistic<MentoringSession>,
    ) -> MentorResult<MentoringSession> {
        let (mentor_id, slot) = (state.current().mentor_id, state.current().slot());
        let outcome = bounded(
            self.config.store_timeout,
            "sessions.update",
            self.store.update_session(state.current()),
        )
        .await;
        if let Err(err) = &outcome
            && state.is_pending()
        {
            tracing::warn!(
                session_id = %state.current().id,
                status = %state.current().status,
                restored = %state.committed().status,
                error = %err,
                "Rolling back session transition"
            );
        }
        state
            .settle(outcome)
            .cloned()
            .map_err(|err| MentorError::from_session_write(err, mentor_id, &slot))
    }
}
