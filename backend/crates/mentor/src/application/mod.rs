//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains the use cases and the platform orchestrator that composes them.

pub mod access_gate;
pub mod audit;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod documents;
pub mod orchestrator;
pub mod response;
pub mod reviews;
pub mod scheduling;
pub mod timeout;
