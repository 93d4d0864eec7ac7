//! Mentor read models: analytics aggregate and dashboard composite

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::value_object::session_status::SessionStatus;

/// Upcoming sessions shown on the dashboard
pub const DASHBOARD_UPCOMING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorAnalytics {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub cancelled_sessions: usize,
    pub no_show_sessions: usize,
    pub upcoming_sessions: usize,
    pub active_mentorships: usize,
    pub average_rating: Option<f64>,
    /// Completed share of all sessions, in percent with one decimal
    pub completion_rate: f64,
}

impl MentorAnalytics {
    pub fn compute(
        sessions: &[MentoringSession],
        mentorships: &[Mentorship],
        now: DateTime<Utc>,
    ) -> Self {
        let count = |status: SessionStatus| sessions.iter().filter(|s| s.status == status).count();
        let completed = count(SessionStatus::Completed);

        let ratings: Vec<f64> = sessions
            .iter()
            .filter_map(|s| s.rating.map(f64::from))
            .collect();
        let average_rating = (!ratings.is_empty())
            .then(|| round1(ratings.iter().sum::<f64>() / ratings.len() as f64));

        let completion_rate = if sessions.is_empty() {
            0.0
        } else {
            round1(completed as f64 * 100.0 / sessions.len() as f64)
        };

        Self {
            total_sessions: sessions.len(),
            completed_sessions: completed,
            cancelled_sessions: count(SessionStatus::Cancelled),
            no_show_sessions: count(SessionStatus::NoShow),
            upcoming_sessions: sessions.iter().filter(|s| is_upcoming(s, now)).count(),
            active_mentorships: mentorships.iter().filter(|m| m.is_active()).count(),
            average_rating,
            completion_rate,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn is_upcoming(session: &MentoringSession, now: DateTime<Utc>) -> bool {
    session.status == SessionStatus::Scheduled && session.scheduled_start >= now
}

/// Composite payload behind the mentor dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorDashboard {
    pub mentor_id: UserId,
    pub mentorships: Vec<Mentorship>,
    pub upcoming_sessions: Vec<MentoringSession>,
    pub pending_reviews: Vec<ReviewRequest>,
    pub analytics: MentorAnalytics,
    pub generated_at: DateTime<Utc>,
}

impl MentorDashboard {
    pub fn compose(
        mentor_id: UserId,
        sessions: &[MentoringSession],
        mentorships: Vec<Mentorship>,
        pending_reviews: Vec<ReviewRequest>,
        now: DateTime<Utc>,
    ) -> Self {
        let analytics = MentorAnalytics::compute(sessions, &mentorships, now);
        let mut upcoming: Vec<MentoringSession> = sessions
            .iter()
            .filter(|s| is_upcoming(s, now))
            .cloned()
            .collect();
        upcoming.sort_by_key(|s| s.scheduled_start);
        upcoming.truncate(DASHBOARD_UPCOMING_LIMIT);

        Self {
            mentor_id,
            mentorships,
            upcoming_sessions: upcoming,
            pending_reviews,
            analytics,
            generated_at: now,
        }
    }
}
