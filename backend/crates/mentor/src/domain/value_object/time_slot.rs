//! Half-open meeting interval `[start, end)`

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MentorError, MentorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Slot starting at `start` and lasting `duration_minutes`
    ///
    /// Fails when the end does not fit in a `DateTime<Utc>`.
    pub fn starting_at(start: DateTime<Utc>, duration_minutes: u32) -> MentorResult<Self> {
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .ok_or_else(|| MentorError::validation("session end is out of range"))?;
        Ok(Self { start, end })
    }

    /// Classic interval overlap; touching endpoints do not overlap
    #[inline]
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_end_is_derived_from_duration() {
        let slot = TimeSlot::starting_at(at(10, 0), 90).unwrap();
        assert_eq!(slot.end, at(11, 30));
        assert_eq!(slot.duration_minutes(), 90);
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let slot = |start, minutes| TimeSlot::starting_at(start, minutes).unwrap();
        let pairs = [
            (slot(at(10, 0), 60), slot(at(10, 30), 60)),
            (slot(at(9, 0), 180), slot(at(10, 0), 15)),
            (slot(at(10, 0), 60), slot(at(10, 0), 60)),
        ];
        for (a, b) in pairs {
            assert!(a.overlaps(&b));
            assert!(b.overlaps(&a));
        }
    }

    #[test]
    fn test_touching_slots_do_not_overlap() {
        let a = TimeSlot::starting_at(at(10, 0), 60).unwrap();
        let b = TimeSlot::starting_at(at(11, 0), 60).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_end_past_calendar_range_is_rejected() {
        let start = DateTime::<Utc>::MAX_UTC - Duration::minutes(30);
        assert!(matches!(
            TimeSlot::starting_at(start, 60),
            Err(MentorError::Validation(_))
        ));
        assert!(TimeSlot::starting_at(start, 30).is_ok());
    }

    #[test]
    fn test_disjoint_slots() {
        let a = TimeSlot::starting_at(at(8, 0), 30).unwrap();
        let b = TimeSlot::starting_at(at(14, 0), 30).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }
}
