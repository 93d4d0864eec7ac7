//! Audit Log Entry
//!
//! Append-only record of an authorization decision, a rate-limit violation
//! or the outcome of a mutating operation.

use chrono::{DateTime, Utc};
use kernel::id::{AuditEntryId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_object::access::{Action, Resource, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub actor_id: UserId,
    /// e.g. `access_denied:session:create`
    pub action: String,
    pub resource_type: Resource,
    pub resource_id: Option<Uuid>,
    pub risk_level: RiskLevel,
    pub reason: Option<String>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        actor_id: UserId,
        action: impl Into<String>,
        resource_type: Resource,
        risk_level: RiskLevel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor_id,
            action: action.into(),
            resource_type,
            resource_id: None,
            risk_level,
            reason: None,
            before: None,
            after: None,
            created_at: now,
        }
    }

    /// Entry for one access-control decision
    pub fn access_decision(
        actor_id: UserId,
        resource: Resource,
        action: Action,
        resource_id: Option<Uuid>,
        denial: Option<(&str, RiskLevel)>,
        now: DateTime<Utc>,
    ) -> Self {
        let (verdict, risk, reason) = match denial {
            Some((reason, risk)) => ("access_denied", risk, Some(reason.to_string())),
            None => ("access_granted", RiskLevel::Low, None),
        };
        let mut entry = Self::new(
            actor_id,
            format!("{verdict}:{resource}:{action}"),
            resource,
            risk,
            now,
        );
        entry.resource_id = resource_id;
        entry.reason = reason;
        entry
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_change(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before = before;
        self.after = after;
        self
    }
}
