//! Mentor Platform Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, lifecycle rules, repository traits
//! - `application/` - Access gate, audit, caching and the platform orchestrator
//! - `infra/` - PostgreSQL and in-memory stores, default collaborators
//! - `presentation/` - HTTP handlers
//!
//! ## Operation Pipeline
//! Every mutating call runs rate limit, access check, validation, domain
//! logic, persistence, cache invalidation, audit and notification in that
//! order. Reads run rate limit, access check and a cached or deduplicated
//! load. Callers always receive a `{ data, error }` envelope.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::MentorConfig;
pub use application::orchestrator::{MentorPlatform, PlatformServices};
pub use application::response::{ServiceError, ServiceResponse};
pub use error::{MentorError, MentorResult, StoreError, StoreResult};
pub use infra::memory::InMemoryMentorStore;
pub use infra::postgres::PgMentorRepository;
pub use presentation::router::mentor_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
