//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of the mentoring platform vocabulary:
//! - Common error types and result aliases
//! - Typed identifiers for users, sessions, mentorships, documents and reviews
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
