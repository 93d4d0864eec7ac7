//! Audit Logger
//!
//! Writes audit entries to the store's sink. A failed write never fails the
//! caller; the entry is kept in an in-process append-only buffer until
//! [`AuditLogger::flush_fallback`] manages to deliver it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::timeout::bounded;
use crate::domain::entity::audit_entry::AuditLogEntry;
use crate::domain::repository::AuditSink;

pub struct AuditLogger<S>
where
    S: AuditSink,
{
    sink: Arc<S>,
    fallback: Mutex<Vec<AuditLogEntry>>,
    timeout: Duration,
}

impl<S> AuditLogger<S>
where
    S: AuditSink,
{
    pub fn new(sink: Arc<S>, timeout: Duration) -> Self {
        Self {
            sink,
            fallback: Mutex::new(Vec::new()),
            timeout,
        }
    }

    pub async fn record(&self, entry: AuditLogEntry) {
        tracing::debug!(
            actor_id = %entry.actor_id,
            action = %entry.action,
            risk = %entry.risk_level,
            "Audit entry"
        );
        let written = bounded(self.timeout, "audit.append", self.sink.append_audit(&entry)).await;
        if let Err(err) = written {
            tracing::error!(
                entry_id = %entry.id,
                action = %entry.action,
                error = %err,
                "Audit sink failed, buffering entry locally"
            );
            self.fallback.lock().await.push(entry);
        }
    }

    /// Entries still waiting for the sink, oldest first
    pub async fn fallback_entries(&self) -> Vec<AuditLogEntry> {
        self.fallback.lock().await.clone()
    }

    /// Re-send buffered entries; returns how many were delivered
    ///
    /// Entries that fail again stay buffered in their original order.
    pub async fn flush_fallback(&self) -> usize {
        let mut buffer = self.fallback.lock().await;
        let pending = std::mem::take(&mut *buffer);
        let mut delivered = 0;
        for entry in pending {
            match bounded(self.timeout, "audit.append", self.sink.append_audit(&entry)).await {
                Ok(()) => delivered += 1,
                Err(_) => buffer.push(entry),
            }
        }
        if delivered > 0 {
            tracing::info!(delivered, remaining = buffer.len(), "Flushed audit fallback buffer");
        }
        delivered
    }
}
