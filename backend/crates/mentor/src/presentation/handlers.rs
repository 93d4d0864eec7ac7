//! HTTP Handlers
//!
//! Thin adapters from requests to `MentorPlatform` operations. Every
//! handler answers with the `{ data, error }` envelope.

use axum::Extension;
use axum::Json;
use axum::extract::{Path, State};
use kernel::id::{DocumentId, ReviewId, SessionId, UserId};
use std::sync::Arc;

use crate::application::orchestrator::MentorPlatform;
use crate::application::response::ServiceResponse;
use crate::domain::entity::analytics::{MentorAnalytics, MentorDashboard};
use crate::domain::entity::document::Document;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::repository::MentorStore;
use crate::presentation::dto::{
    CancelSessionRequest, CompleteSessionRequest, CreateDocumentRequest, CreateSessionRequest,
    RequestReviewRequest, RescheduleRequest, ResolveReviewRequest, UploadDocumentRequest,
};
use crate::presentation::middleware::Actor;

/// Shared state for mentor handlers
pub struct MentorAppState<S>
where
    S: MentorStore,
{
    pub platform: Arc<MentorPlatform<S>>,
}

impl<S> Clone for MentorAppState<S>
where
    S: MentorStore,
{
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
        }
    }
}

// -------------------------------------------------------------------------
// Sessions
// -------------------------------------------------------------------------

/// POST /api/mentor/sessions
pub async fn create_session<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Json(req): Json<CreateSessionRequest>,
) -> ServiceResponse<MentoringSession>
where
    S: MentorStore,
{
    state.platform.create_session(actor, req.into()).await
}

/// POST /api/mentor/sessions/{id}/reschedule
pub async fn reschedule_session<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<RescheduleRequest>,
) -> ServiceResponse<MentoringSession>
where
    S: MentorStore,
{
    state
        .platform
        .reschedule_session(actor, req.into_input(session_id))
        .await
}

/// POST /api/mentor/sessions/{id}/start
pub async fn start_session<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(session_id): Path<SessionId>,
) -> ServiceResponse<MentoringSession>
where
    S: MentorStore,
{
    state.platform.start_session(actor, session_id).await
}

/// POST /api/mentor/sessions/{id}/complete
pub async fn complete_session<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<CompleteSessionRequest>,
) -> ServiceResponse<MentoringSession>
where
    S: MentorStore,
{
    state
        .platform
        .complete_session(actor, session_id, req.into())
        .await
}

/// POST /api/mentor/sessions/{id}/cancel
pub async fn cancel_session<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<CancelSessionRequest>,
) -> ServiceResponse<MentoringSession>
where
    S: MentorStore,
{
    state
        .platform
        .cancel_session(actor, session_id, req.reason)
        .await
}

/// POST /api/mentor/sessions/{id}/no-show
pub async fn mark_no_show<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(session_id): Path<SessionId>,
) -> ServiceResponse<MentoringSession>
where
    S: MentorStore,
{
    state.platform.mark_no_show(actor, session_id).await
}

// -------------------------------------------------------------------------
// Mentor read model
// -------------------------------------------------------------------------

/// GET /api/mentor/mentors/{id}/dashboard
pub async fn fetch_dashboard<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(mentor_id): Path<UserId>,
) -> ServiceResponse<MentorDashboard>
where
    S: MentorStore,
{
    state.platform.fetch_dashboard(actor, mentor_id).await
}

/// GET /api/mentor/mentors/{id}/sessions
pub async fn get_sessions<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(mentor_id): Path<UserId>,
) -> ServiceResponse<Vec<MentoringSession>>
where
    S: MentorStore,
{
    state.platform.get_sessions(actor, mentor_id).await
}

/// GET /api/mentor/mentors/{id}/mentorships
pub async fn get_mentorships<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(mentor_id): Path<UserId>,
) -> ServiceResponse<Vec<Mentorship>>
where
    S: MentorStore,
{
    state.platform.get_mentorships(actor, mentor_id).await
}

/// GET /api/mentor/mentors/{id}/reviews
pub async fn get_pending_reviews<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(mentor_id): Path<UserId>,
) -> ServiceResponse<Vec<ReviewRequest>>
where
    S: MentorStore,
{
    state.platform.get_pending_reviews(actor, mentor_id).await
}

/// GET /api/mentor/mentors/{id}/analytics
pub async fn get_analytics<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(mentor_id): Path<UserId>,
) -> ServiceResponse<MentorAnalytics>
where
    S: MentorStore,
{
    state.platform.get_analytics(actor, mentor_id).await
}

/// GET /api/mentor/mentors/{id}/documents
pub async fn get_documents<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(mentor_id): Path<UserId>,
) -> ServiceResponse<Vec<Document>>
where
    S: MentorStore,
{
    state.platform.get_cached_documents(actor, mentor_id).await
}

// -------------------------------------------------------------------------
// Documents
// -------------------------------------------------------------------------

/// POST /api/mentor/documents
pub async fn create_document<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Json(req): Json<CreateDocumentRequest>,
) -> ServiceResponse<Document>
where
    S: MentorStore,
{
    state.platform.create_document(actor, req.into()).await
}

/// POST /api/mentor/documents/upload
pub async fn upload_document<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Json(req): Json<UploadDocumentRequest>,
) -> ServiceResponse<Document>
where
    S: MentorStore,
{
    let input = match req.into_input() {
        Ok(input) => input,
        Err(e) => {
            e.log();
            return ServiceResponse::failed(e);
        }
    };
    state.platform.upload_document(actor, input).await
}

/// GET /api/mentor/documents/{id}
pub async fn get_document<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(document_id): Path<DocumentId>,
) -> ServiceResponse<Document>
where
    S: MentorStore,
{
    state.platform.get_document(actor, document_id).await
}

// -------------------------------------------------------------------------
// Reviews
// -------------------------------------------------------------------------

/// POST /api/mentor/reviews
pub async fn request_review<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Json(req): Json<RequestReviewRequest>,
) -> ServiceResponse<ReviewRequest>
where
    S: MentorStore,
{
    state.platform.request_review(actor, req.into()).await
}

/// POST /api/mentor/reviews/{id}/complete
pub async fn complete_review<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(review_id): Path<ReviewId>,
    Json(req): Json<ResolveReviewRequest>,
) -> ServiceResponse<ReviewRequest>
where
    S: MentorStore,
{
    state
        .platform
        .complete_review(actor, review_id, req.feedback)
        .await
}

/// POST /api/mentor/reviews/{id}/return
pub async fn return_review<S>(
    State(state): State<MentorAppState<S>>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(review_id): Path<ReviewId>,
    Json(req): Json<ResolveReviewRequest>,
) -> ServiceResponse<ReviewRequest>
where
    S: MentorStore,
{
    state
        .platform
        .return_review(actor, review_id, req.feedback)
        .await
}
