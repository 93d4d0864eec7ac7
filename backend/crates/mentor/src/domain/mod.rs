//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (MentoringSession, Mentorship, Document, ReviewRequest, AuditLogEntry)
//! - Domain value objects (UserRole, SessionStatus, TimeSlot, DocumentAccess, ...)
//! - Domain services (conflict detection, permission table, progress)
//! - Repository traits and external collaborator ports

pub mod entity;
pub mod ports;
pub mod repository;
pub mod services;
pub mod value_object;
