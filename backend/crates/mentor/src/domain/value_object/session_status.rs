//! Session Status Value Objects
//!
//! Lifecycle of a mentoring session:
//!
//! ```text
//! scheduled ──start──▶ in_progress ──complete──▶ completed
//!     │  ▲                                           ▲
//!     │  └──confirm── rescheduled ◀──reschedule──┐   │
//!     │                                          │   │
//!     ├──────────────────────────────────────────┘   │
//!     ├──complete (start skipped)────────────────────┘
//!     ├──cancel──▶ cancelled
//!     └──no_show─▶ no_show
//! ```
//!
//! `completed`, `cancelled` and `no_show` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mentoring session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    /// Transient state while a new interval is re-validated
    Rescheduled,
    NoShow,
}

/// Requested lifecycle move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTransition {
    Start,
    Complete,
    Cancel,
    Reschedule,
    ConfirmReschedule,
    MarkNoShow,
}

impl SessionStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
            Self::NoShow => "no_show",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "scheduled" => Some(Self::Scheduled),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "rescheduled" => Some(Self::Rescheduled),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// No transition leaves a terminal state
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether a session in this state occupies the mentor's calendar
    #[inline]
    pub const fn blocks_calendar(&self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress)
    }

    /// Target state of `transition`, or `None` when the move is illegal
    pub const fn next(&self, transition: SessionTransition) -> Option<SessionStatus> {
        use SessionStatus::*;
        use SessionTransition::*;
        match (self, transition) {
            (Scheduled, Start) => Some(InProgress),
            (Scheduled | InProgress, Complete) => Some(Completed),
            (Scheduled, Cancel) => Some(Cancelled),
            (Scheduled, Reschedule) => Some(Rescheduled),
            (Rescheduled, ConfirmReschedule) => Some(Scheduled),
            (Scheduled, MarkNoShow) => Some(NoShow),
            _ => None,
        }
    }
}

impl SessionTransition {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Reschedule => "reschedule",
            Self::ConfirmReschedule => "confirm_reschedule",
            Self::MarkNoShow => "mark_no_show",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for SessionTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
