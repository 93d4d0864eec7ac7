//! Mentor Middleware

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::id::UserId;

use crate::error::MentorError;

/// Header carrying the authenticated user's id
///
/// Set by the upstream identity layer; this service does not authenticate.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Acting user resolved for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub UserId);

pub fn extract_actor(headers: &HeaderMap) -> Result<Actor, MentorError> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(MentorError::MissingActor)?;

    raw.parse::<UserId>()
        .map(Actor)
        .map_err(|_| MentorError::validation("X-Actor-Id is not a valid id"))
}

/// Middleware that requires an acting user on every mentor route
pub async fn require_actor(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    let actor = match extract_actor(req.headers()) {
        Ok(actor) => actor,
        Err(e) => return Err(e.into_response()),
    };

    tracing::debug!(actor = %actor.0, path = %req.uri().path(), "Resolved actor");
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_actor(&headers),
            Err(MentorError::MissingActor)
        ));
    }

    #[test]
    fn test_blank_header_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("  "));
        assert!(matches!(
            extract_actor(&headers),
            Err(MentorError::MissingActor)
        ));
    }

    #[test]
    fn test_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            extract_actor(&headers),
            Err(MentorError::Validation(_))
        ));
    }

    #[test]
    fn test_valid_header() {
        let id = UserId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACTOR_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(extract_actor(&headers).unwrap(), Actor(id));
    }
}
