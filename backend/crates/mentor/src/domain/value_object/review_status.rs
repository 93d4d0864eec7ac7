use serde::{Deserialize, Serialize};
use std::fmt;

/// Review request status; `Completed` and `Returned` are final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Completed,
    /// Sent back to the mentee for changes
    Returned,
}

impl ReviewStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Returned => "returned",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "returned" => Some(Self::Returned),
            _ => None,
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
