//! API DTOs (Data Transfer Objects)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use kernel::id::{DocumentId, MentorshipId, SessionId};
use serde::Deserialize;

use crate::application::documents::{CreateDocumentInput, UploadDocumentInput};
use crate::application::reviews::RequestReviewInput;
use crate::application::scheduling::{CompleteSessionInput, CreateSessionInput, RescheduleInput};
use crate::domain::value_object::document_access::DocumentAccess;
use crate::domain::value_object::session_type::SessionType;
use crate::error::{MentorError, MentorResult};

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Request for POST /api/mentor/sessions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub mentorship_id: MentorshipId,
    pub title: String,
    pub session_type: SessionType,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl From<CreateSessionRequest> for CreateSessionInput {
    fn from(req: CreateSessionRequest) -> Self {
        Self {
            mentorship_id: req.mentorship_id,
            title: req.title,
            session_type: req.session_type,
            scheduled_start: req.scheduled_start,
            duration_minutes: req.duration_minutes,
            timezone: req.timezone,
        }
    }
}

/// Request for POST /api/mentor/sessions/{id}/reschedule
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub new_start: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl RescheduleRequest {
    pub fn into_input(self, session_id: SessionId) -> RescheduleInput {
        RescheduleInput {
            session_id,
            new_start: self.new_start,
            duration_minutes: self.duration_minutes,
        }
    }
}

/// Request for POST /api/mentor/sessions/{id}/complete
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionRequest {
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub follow_up_required: bool,
}

impl From<CompleteSessionRequest> for CompleteSessionInput {
    fn from(req: CompleteSessionRequest) -> Self {
        Self {
            feedback: req.feedback,
            rating: req.rating,
            follow_up_required: req.follow_up_required,
        }
    }
}

/// Request for POST /api/mentor/sessions/{id}/cancel
#[derive(Debug, Clone, Deserialize)]
pub struct CancelSessionRequest {
    pub reason: String,
}

/// Request for POST /api/mentor/documents/upload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentRequest {
    pub title: String,
    pub document_type: String,
    pub file_name: String,
    pub content_base64: String,
    #[serde(default)]
    pub access: DocumentAccess,
}

impl UploadDocumentRequest {
    pub fn into_input(self) -> MentorResult<UploadDocumentInput> {
        let content = STANDARD
            .decode(self.content_base64.as_bytes())
            .map_err(|_| MentorError::validation("contentBase64 is not valid base64"))?;
        Ok(UploadDocumentInput {
            title: self.title,
            document_type: self.document_type,
            file_name: self.file_name,
            content,
            access: self.access,
        })
    }
}

/// Request for POST /api/mentor/documents
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub title: String,
    pub document_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub access: DocumentAccess,
}

impl From<CreateDocumentRequest> for CreateDocumentInput {
    fn from(req: CreateDocumentRequest) -> Self {
        Self {
            title: req.title,
            document_type: req.document_type,
            url: req.url,
            access: req.access,
        }
    }
}

/// Request for POST /api/mentor/reviews
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReviewRequest {
    pub document_id: DocumentId,
    #[serde(default)]
    pub note: Option<String>,
}

impl From<RequestReviewRequest> for RequestReviewInput {
    fn from(req: RequestReviewRequest) -> Self {
        Self {
            document_id: req.document_id,
            note: req.note,
        }
    }
}

/// Request for POST /api/mentor/reviews/{id}/complete and /return
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveReviewRequest {
    pub feedback: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_defaults_timezone() {
        let req: CreateSessionRequest = serde_json::from_value(serde_json::json!({
            "mentorshipId": "7d4f0a8e-8f4a-4b7e-9d43-0c0a3c1e2b11",
            "title": "Kickoff",
            "sessionType": "initial_consultation",
            "scheduledStart": "2026-03-02T10:00:00Z",
            "durationMinutes": 60
        }))
        .unwrap();
        assert_eq!(req.timezone, "UTC");
        assert_eq!(req.session_type, SessionType::InitialConsultation);
    }

    #[test]
    fn test_upload_decodes_content() {
        let req = UploadDocumentRequest {
            title: "CV".into(),
            document_type: "resume".into(),
            file_name: "cv.pdf".into(),
            content_base64: STANDARD.encode(b"%PDF-1.7"),
            access: DocumentAccess::Private,
        };
        let input = req.into_input().unwrap();
        assert_eq!(input.content, b"%PDF-1.7");
    }

    #[test]
    fn test_upload_rejects_bad_base64() {
        let req = UploadDocumentRequest {
            title: "CV".into(),
            document_type: "resume".into(),
            file_name: "cv.pdf".into(),
            content_base64: "***".into(),
            access: DocumentAccess::Private,
        };
        assert!(matches!(req.into_input(), Err(MentorError::Validation(_))));
    }

    #[test]
    fn test_access_policy_shape() {
        let req: CreateDocumentRequest = serde_json::from_value(serde_json::json!({
            "title": "Guide",
            "documentType": "guide",
            "access": { "level": "public" }
        }))
        .unwrap();
        assert_eq!(req.access, DocumentAccess::Public);
        assert!(req.url.is_none());
    }
}
