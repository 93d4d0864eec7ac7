//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations with no domain knowledge:
//! - Injectable time source (system clock, manual clock for tests)
//! - Fixed-window rate limiting
//! - TTL cache with lazy expiry
//! - In-flight request deduplication
//! - Optimistic update / rollback helper

pub mod cache;
pub mod clock;
pub mod dedupe;
pub mod optimistic;
pub mod rate_limit;
