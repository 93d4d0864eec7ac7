//! Value Object Module

pub mod access;
pub mod document_access;
pub mod mentorship_status;
pub mod review_status;
pub mod session_status;
pub mod session_type;
pub mod time_slot;
pub mod user_role;
