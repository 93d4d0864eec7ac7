//! Access-control vocabulary: resources, actions and risk levels

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Resource family an action targets
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    #[display("session")]
    Session,
    #[display("mentorship")]
    Mentorship,
    #[display("document")]
    Document,
    #[display("review")]
    Review,
    #[display("analytics")]
    Analytics,
    #[display("dashboard")]
    Dashboard,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[display("create")]
    Create,
    #[display("read")]
    Read,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("cancel")]
    Cancel,
    #[display("review")]
    Review,
}

/// Severity attached to an audit entry
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[display("low")]
    Low,
    #[display("medium")]
    Medium,
    #[display("high")]
    High,
    #[display("critical")]
    Critical,
}

impl RiskLevel {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl Resource {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "session" => Some(Self::Session),
            "mentorship" => Some(Self::Mentorship),
            "document" => Some(Self::Document),
            "review" => Some(Self::Review),
            "analytics" => Some(Self::Analytics),
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(Resource::Dashboard.to_string(), "dashboard");
        assert_eq!(Action::Cancel.to_string(), "cancel");
        assert_eq!(
            serde_json::to_string(&RiskLevel::High).unwrap(),
            format!("\"{}\"", RiskLevel::High)
        );
    }

    #[test]
    fn test_from_code() {
        assert_eq!(RiskLevel::from_code("critical"), Some(RiskLevel::Critical));
        assert_eq!(Resource::from_code("review"), Some(Resource::Review));
        assert_eq!(Resource::from_code("profile"), None);
    }
}
