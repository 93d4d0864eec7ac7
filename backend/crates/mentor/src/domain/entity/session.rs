//! Mentoring Session Entity
//!
//! One scheduled meeting inside a mentorship. Sessions are never deleted;
//! cancellation and no-shows are terminal statuses.

use chrono::{DateTime, Utc};
use kernel::id::{MentorshipId, SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::session_status::{SessionStatus, SessionTransition};
use crate::domain::value_object::session_type::SessionType;
use crate::domain::value_object::time_slot::TimeSlot;
use crate::error::{MentorError, MentorResult};

/// Highest rating a mentee can give
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentoringSession {
    pub id: SessionId,
    pub mentorship_id: MentorshipId,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub title: String,
    pub session_type: SessionType,
    pub scheduled_start: DateTime<Utc>,
    /// Always `scheduled_start + duration_minutes`
    pub scheduled_end: DateTime<Utc>,
    pub duration_minutes: u32,
    pub timezone: String,
    pub status: SessionStatus,
    pub rating: Option<u8>,
    pub feedback: Option<String>,
    pub follow_up_required: bool,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub reschedule_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields chosen by the caller when booking
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub mentorship_id: MentorshipId,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub title: String,
    pub session_type: SessionType,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub timezone: String,
}

/// Outcome recorded when a session completes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub feedback: Option<String>,
    pub rating: Option<u8>,
    pub follow_up_required: bool,
}

impl MentoringSession {
    /// Create a new session in `scheduled`
    pub fn schedule(draft: SessionDraft, now: DateTime<Utc>) -> MentorResult<Self> {
        let slot = TimeSlot::starting_at(draft.scheduled_start, draft.duration_minutes)?;
        Ok(Self {
            id: SessionId::new(),
            mentorship_id: draft.mentorship_id,
            mentor_id: draft.mentor_id,
            mentee_id: draft.mentee_id,
            title: draft.title,
            session_type: draft.session_type,
            scheduled_start: slot.start,
            scheduled_end: slot.end,
            duration_minutes: draft.duration_minutes,
            timezone: draft.timezone,
            status: SessionStatus::Scheduled,
            rating: None,
            feedback: None,
            follow_up_required: false,
            actual_start: None,
            actual_end: None,
            cancellation_reason: None,
            reschedule_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.scheduled_start,
            end: self.scheduled_end,
        }
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.mentor_id == user || self.mentee_id == user
    }

    pub fn blocks_calendar(&self) -> bool {
        self.status.blocks_calendar()
    }

    fn advance(&mut self, transition: SessionTransition, now: DateTime<Utc>) -> MentorResult<()> {
        let next = self
            .status
            .next(transition)
            .ok_or_else(|| MentorError::InvalidTransition {
                entity: "session",
                from: self.status.code().to_string(),
                action: transition.code().to_string(),
            })?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> MentorResult<()> {
        self.advance(SessionTransition::Start, now)?;
        self.actual_start = Some(now);
        Ok(())
    }

    /// Complete from `in_progress`, or straight from `scheduled`
    pub fn complete(&mut self, completion: Completion, now: DateTime<Utc>) -> MentorResult<()> {
        if let Some(rating) = completion.rating
            && rating > MAX_RATING
        {
            return Err(MentorError::validation(format!(
                "rating must be between 0 and {MAX_RATING}"
            )));
        }
        self.advance(SessionTransition::Complete, now)?;
        self.actual_start.get_or_insert(now);
        self.actual_end = Some(now);
        self.feedback = completion.feedback;
        self.rating = completion.rating;
        self.follow_up_required = completion.follow_up_required;
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> MentorResult<()> {
        self.advance(SessionTransition::Cancel, now)?;
        self.cancellation_reason = Some(reason.into());
        Ok(())
    }

    pub fn mark_no_show(&mut self, now: DateTime<Utc>) -> MentorResult<()> {
        self.advance(SessionTransition::MarkNoShow, now)
    }

    /// Move to a new interval: `scheduled -> rescheduled -> scheduled`
    ///
    /// The caller is responsible for the overlap check against the new slot.
    pub fn reschedule(
        &mut self,
        new_start: DateTime<Utc>,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> MentorResult<()> {
        let slot = TimeSlot::starting_at(new_start, duration_minutes)?;
        self.advance(SessionTransition::Reschedule, now)?;
        self.scheduled_start = slot.start;
        self.scheduled_end = slot.end;
        self.duration_minutes = duration_minutes;
        self.reschedule_count += 1;
        self.advance(SessionTransition::ConfirmReschedule, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn session() -> MentoringSession {
        MentoringSession::schedule(
            SessionDraft {
                mentorship_id: MentorshipId::new(),
                mentor_id: UserId::new(),
                mentee_id: UserId::new(),
                title: "Statement of purpose".into(),
                session_type: SessionType::DocumentReview,
                scheduled_start: now() + Duration::days(1),
                duration_minutes: 60,
                timezone: "Asia/Tokyo".into(),
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_derives_end() {
        let s = session();
        assert_eq!(s.status, SessionStatus::Scheduled);
        assert_eq!(s.scheduled_end - s.scheduled_start, Duration::minutes(60));
    }

    #[test]
    fn test_start_then_complete() {
        let mut s = session();
        let started = now() + Duration::days(1);
        s.start(started).unwrap();
        assert_eq!(s.status, SessionStatus::InProgress);
        assert_eq!(s.actual_start, Some(started));

        let ended = started + Duration::minutes(55);
        s.complete(
            Completion {
                feedback: Some("Tighten the second paragraph".into()),
                rating: Some(5),
                follow_up_required: true,
            },
            ended,
        )
        .unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.actual_start, Some(started));
        assert_eq!(s.actual_end, Some(ended));
        assert_eq!(s.rating, Some(5));
        assert!(s.follow_up_required);
    }

    #[test]
    fn test_rating_out_of_range_leaves_status() {
        let mut s = session();
        let err = s
            .complete(
                Completion {
                    rating: Some(6),
                    ..Completion::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, MentorError::Validation(_)));
        assert_eq!(s.status, SessionStatus::Scheduled);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut cancelled = session();
        cancelled.cancel("mentor unavailable", now()).unwrap();

        let mut completed = session();
        completed.complete(Completion::default(), now()).unwrap();

        let mut no_show = session();
        no_show.mark_no_show(now()).unwrap();

        for mut s in [cancelled, completed, no_show] {
            let before = s.clone();
            assert!(matches!(
                s.start(now()),
                Err(MentorError::InvalidTransition { .. })
            ));
            assert!(s.cancel("again", now()).is_err());
            assert!(s.complete(Completion::default(), now()).is_err());
            assert!(s.mark_no_show(now()).is_err());
            assert!(s.reschedule(now(), 30, now()).is_err());
            assert_eq!(s, before);
        }
    }

    #[test]
    fn test_reschedule_recomputes_end() {
        let mut s = session();
        let new_start = now() + Duration::days(3);
        s.reschedule(new_start, 90, now()).unwrap();
        assert_eq!(s.status, SessionStatus::Scheduled);
        assert_eq!(s.scheduled_start, new_start);
        assert_eq!(s.scheduled_end, new_start + Duration::minutes(90));
        assert_eq!(s.duration_minutes, 90);
        assert_eq!(s.reschedule_count, 1);
    }

    #[test]
    fn test_in_progress_cannot_reschedule() {
        let mut s = session();
        s.start(now()).unwrap();
        let err = s.reschedule(now(), 30, now()).unwrap_err();
        assert!(matches!(err, MentorError::InvalidTransition { .. }));
        assert_eq!(s.status, SessionStatus::InProgress);
    }
}
