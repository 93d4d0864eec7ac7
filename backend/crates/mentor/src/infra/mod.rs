//! Infrastructure Layer
//!
//! Store implementations and the default external collaborators.

pub mod collaborators;
pub mod memory;
pub mod postgres;
