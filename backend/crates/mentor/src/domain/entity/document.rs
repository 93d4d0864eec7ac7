use chrono::{DateTime, Utc};
use kernel::id::{DocumentId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::document_access::DocumentAccess;

/// Document owned by a mentor
///
/// Uploaded files carry a `file_name` and `storage_url`; metadata-only
/// documents (template links, shared notes) leave both empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub mentor_id: UserId,
    pub title: String,
    pub document_type: String,
    pub file_name: Option<String>,
    pub storage_url: Option<String>,
    pub size_bytes: u64,
    pub access: DocumentAccess,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn permits_read(&self, actor: UserId) -> bool {
        self.access.permits(actor, self.mentor_id)
    }

    pub fn is_owner(&self, actor: UserId) -> bool {
        self.mentor_id == actor
    }
}
