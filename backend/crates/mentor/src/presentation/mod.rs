//! Presentation Layer
//!
//! HTTP handlers and DTOs for the mentor API.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
