//! Entity Module

pub mod analytics;
pub mod audit_entry;
pub mod document;
pub mod mentorship;
pub mod review;
pub mod session;
