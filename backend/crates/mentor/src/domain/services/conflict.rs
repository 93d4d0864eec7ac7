use kernel::id::SessionId;

use crate::domain::entity::session::MentoringSession;
use crate::domain::value_object::time_slot::TimeSlot;

/// First session blocking `candidate`, if any
///
/// Only sessions that still occupy the calendar (`scheduled`,
/// `in_progress`) are considered. `exclude` skips the session being
/// rescheduled.
pub fn find_conflict<'a>(
    existing: &'a [MentoringSession],
    candidate: &TimeSlot,
    exclude: Option<SessionId>,
) -> Option<&'a MentoringSession> {
    existing
        .iter()
        .filter(|s| Some(s.id) != exclude)
        .filter(|s| s.blocks_calendar())
        .find(|s| s.slot().overlaps(candidate))
}

pub fn has_conflict(
    existing: &[MentoringSession],
    candidate: &TimeSlot,
    exclude: Option<SessionId>,
) -> bool {
    find_conflict(existing, candidate, exclude).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::session::SessionDraft;
    use crate::domain::value_object::session_type::SessionType;
    use chrono::{DateTime, TimeZone, Utc};
    use kernel::id::{MentorshipId, UserId};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, hour, minute, 0).unwrap()
    }

    fn booked(start: DateTime<Utc>, minutes: u32) -> MentoringSession {
        MentoringSession::schedule(
            SessionDraft {
                mentorship_id: MentorshipId::new(),
                mentor_id: UserId::new(),
                mentee_id: UserId::new(),
                title: "Mock interview".into(),
                session_type: SessionType::InterviewPrep,
                scheduled_start: start,
                duration_minutes: minutes,
                timezone: "UTC".into(),
            },
            at(0, 0),
        )
        .unwrap()
    }

    #[test]
    fn test_overlap_detected() {
        let existing = vec![booked(at(10, 0), 60)];
        let candidate = TimeSlot::starting_at(at(10, 30), 60).unwrap();
        assert!(has_conflict(&existing, &candidate, None));
    }

    #[test]
    fn test_adjacent_is_free() {
        let existing = vec![booked(at(10, 0), 60)];
        assert!(!has_conflict(
            &existing,
            &TimeSlot::starting_at(at(11, 0), 60).unwrap(),
            None
        ));
        assert!(!has_conflict(
            &existing,
            &TimeSlot::starting_at(at(9, 0), 60).unwrap(),
            None
        ));
    }

    #[test]
    fn test_exclude_self() {
        let existing = vec![booked(at(10, 0), 60)];
        let own = existing[0].id;
        let candidate = TimeSlot::starting_at(at(10, 15), 60).unwrap();
        assert!(!has_conflict(&existing, &candidate, Some(own)));
    }

    #[test]
    fn test_inactive_sessions_do_not_block() {
        let mut cancelled = booked(at(10, 0), 60);
        cancelled.cancel("moved", at(1, 0)).unwrap();
        let candidate = TimeSlot::starting_at(at(10, 0), 60).unwrap();
        assert!(!has_conflict(&[cancelled], &candidate, None));
    }

    #[test]
    fn test_in_progress_blocks() {
        let mut running = booked(at(10, 0), 60);
        running.start(at(10, 0)).unwrap();
        let candidate = TimeSlot::starting_at(at(10, 59), 15).unwrap();
        let existing = [running];
        let found = find_conflict(&existing, &candidate, None).unwrap();
        assert_eq!(found.id, existing[0].id);
    }
}
