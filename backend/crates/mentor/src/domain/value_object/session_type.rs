use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mentoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    InitialConsultation,
    DocumentReview,
    InterviewPrep,
    GeneralGuidance,
    ProgressCheck,
    CareerPlanning,
}

impl SessionType {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InitialConsultation => "initial_consultation",
            Self::DocumentReview => "document_review",
            Self::InterviewPrep => "interview_prep",
            Self::GeneralGuidance => "general_guidance",
            Self::ProgressCheck => "progress_check",
            Self::CareerPlanning => "career_planning",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "initial_consultation" => Some(Self::InitialConsultation),
            "document_review" => Some(Self::DocumentReview),
            "interview_prep" => Some(Self::InterviewPrep),
            "general_guidance" => Some(Self::GeneralGuidance),
            "progress_check" => Some(Self::ProgressCheck),
            "career_planning" => Some(Self::CareerPlanning),
            _ => None,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_rejects_unknown() {
        assert_eq!(
            SessionType::from_code("interview_prep"),
            Some(SessionType::InterviewPrep)
        );
        assert_eq!(SessionType::from_code("coffee_chat"), None);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&SessionType::CareerPlanning).unwrap();
        assert_eq!(json, "\"career_planning\"");
    }
}
