//! Mentor Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::orchestrator::MentorPlatform;
use crate::domain::repository::MentorStore;
use crate::presentation::handlers::{self, MentorAppState};
use crate::presentation::middleware::require_actor;

/// Create the mentor router for any store implementation
///
/// Mount under `/api/mentor`. Every route requires the `X-Actor-Id` header.
pub fn mentor_router<S>(platform: Arc<MentorPlatform<S>>) -> Router
where
    S: MentorStore,
{
    let state = MentorAppState { platform };

    Router::new()
        .route("/sessions", post(handlers::create_session::<S>))
        .route(
            "/sessions/{id}/reschedule",
            post(handlers::reschedule_session::<S>),
        )
        .route("/sessions/{id}/start", post(handlers::start_session::<S>))
        .route(
            "/sessions/{id}/complete",
            post(handlers::complete_session::<S>),
        )
        .route("/sessions/{id}/cancel", post(handlers::cancel_session::<S>))
        .route("/sessions/{id}/no-show", post(handlers::mark_no_show::<S>))
        .route(
            "/mentors/{id}/dashboard",
            get(handlers::fetch_dashboard::<S>),
        )
        .route("/mentors/{id}/sessions", get(handlers::get_sessions::<S>))
        .route(
            "/mentors/{id}/mentorships",
            get(handlers::get_mentorships::<S>),
        )
        .route(
            "/mentors/{id}/reviews",
            get(handlers::get_pending_reviews::<S>),
        )
        .route(
            "/mentors/{id}/analytics",
            get(handlers::get_analytics::<S>),
        )
        .route(
            "/mentors/{id}/documents",
            get(handlers::get_documents::<S>),
        )
        .route("/documents", post(handlers::create_document::<S>))
        .route(
            "/documents/upload",
            post(handlers::upload_document::<S>),
        )
        .route("/documents/{id}", get(handlers::get_document::<S>))
        .route("/reviews", post(handlers::request_review::<S>))
        .route(
            "/reviews/{id}/complete",
            post(handlers::complete_review::<S>),
        )
        .route("/reviews/{id}/return", post(handlers::return_review::<S>))
        .layer(middleware::from_fn(require_actor))
        .with_state(state)
}
