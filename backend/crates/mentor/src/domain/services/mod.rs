//! Domain Services
//!
//! Pure decision logic shared by the use cases: interval conflicts, the
//! static permission table and mentorship progress.

pub mod conflict;
pub mod permissions;
pub mod progress;
