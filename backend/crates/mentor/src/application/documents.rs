//! Document Use Case
//!
//! Uploads (file stored through [`FileStorage`], record inserted after) and
//! metadata-only documents such as template links.

use kernel::id::{DocumentId, UserId};
use platform::clock::Clock;
use std::sync::Arc;

use crate::application::config::MentorConfig;
use crate::application::timeout::bounded;
use crate::domain::entity::document::Document;
use crate::domain::ports::FileStorage;
use crate::domain::repository::{DocumentRepository, MentorStore};
use crate::domain::value_object::access::Resource;
use crate::domain::value_object::document_access::DocumentAccess;
use crate::error::{MentorError, MentorResult, StoreError};

#[derive(Debug, Clone)]
pub struct UploadDocumentInput {
    pub title: String,
    pub document_type: String,
    pub file_name: String,
    pub content: Vec<u8>,
    pub access: DocumentAccess,
}

impl UploadDocumentInput {
    pub fn validate(&self, config: &MentorConfig) -> MentorResult<()> {
        validate_metadata(&self.title, &self.document_type, &self.access, config)?;
        if self.file_name.trim().is_empty() || self.file_name.contains(['/', '\\']) {
            return Err(MentorError::validation("file name must be a plain, non-empty name"));
        }
        if !config.allows_extension(&self.file_name) {
            return Err(MentorError::validation(format!(
                "file type not allowed; accepted: {}",
                config.allowed_document_extensions.join(", ")
            )));
        }
        if self.content.is_empty() {
            return Err(MentorError::validation("file is empty"));
        }
        if self.content.len() > config.max_document_bytes {
            return Err(MentorError::validation(format!(
                "file exceeds the {} byte limit",
                config.max_document_bytes
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    pub title: String,
    pub document_type: String,
    /// External link, e.g. a shared template
    pub url: Option<String>,
    pub access: DocumentAccess,
}

impl CreateDocumentInput {
    pub fn validate(&self, config: &MentorConfig) -> MentorResult<()> {
        validate_metadata(&self.title, &self.document_type, &self.access, config)?;
        if let Some(url) = &self.url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(MentorError::validation("url must be http(s)"));
        }
        Ok(())
    }
}

fn validate_metadata(
    title: &str,
    document_type: &str,
    access: &DocumentAccess,
    config: &MentorConfig,
) -> MentorResult<()> {
    if title.trim().is_empty() {
        return Err(MentorError::validation("title is required"));
    }
    if title.chars().count() > config.max_title_chars {
        return Err(MentorError::validation("title is too long"));
    }
    if document_type.trim().is_empty() {
        return Err(MentorError::validation("document type is required"));
    }
    if let DocumentAccess::SpecificMentees(mentees) = access
        && mentees.is_empty()
    {
        return Err(MentorError::validation(
            "specific_mentees access needs at least one mentee",
        ));
    }
    Ok(())
}

pub struct DocumentService<S>
where
    S: MentorStore,
{
    store: Arc<S>,
    files: Arc<dyn FileStorage>,
    clock: Arc<dyn Clock>,
    config: Arc<MentorConfig>,
}

impl<S> DocumentService<S>
where
    S: MentorStore,
{
    pub fn new(
        store: Arc<S>,
        files: Arc<dyn FileStorage>,
        clock: Arc<dyn Clock>,
        config: Arc<MentorConfig>,
    ) -> Self {
        Self {
            store,
            files,
            clock,
            config,
        }
    }

    pub async fn upload(
        &self,
        mentor_id: UserId,
        input: UploadDocumentInput,
    ) -> MentorResult<Document> {
        let id = DocumentId::new();
        let path = format!("documents/{mentor_id}/{id}/{}", input.file_name);

        let url = match tokio::time::timeout(
            self.config.collaborator_timeout,
            self.files.put(&path, &input.content),
        )
        .await
        {
            Ok(Ok(url)) => url,
            Ok(Err(err)) => return Err(StoreError::new("files.put", err.to_string()).into()),
            Err(_) => {
                return Err(
                    StoreError::timed_out("files.put", self.config.collaborator_timeout).into(),
                );
            }
        };

        let now = self.clock.now();
        let document = Document {
            id,
            mentor_id,
            title: input.title.trim().to_string(),
            document_type: input.document_type,
            file_name: Some(input.file_name),
            storage_url: Some(url),
            size_bytes: input.content.len() as u64,
            access: input.access,
            created_at: now,
            updated_at: now,
        };
        self.insert(&document).await?;

        tracing::info!(
            document_id = %document.id,
            mentor_id = %mentor_id,
            size_bytes = document.size_bytes,
            "Uploaded document"
        );
        Ok(document)
    }

    pub async fn create(
        &self,
        mentor_id: UserId,
        input: CreateDocumentInput,
    ) -> MentorResult<Document> {
        let now = self.clock.now();
        let document = Document {
            id: DocumentId::new(),
            mentor_id,
            title: input.title.trim().to_string(),
            document_type: input.document_type,
            file_name: None,
            storage_url: input.url,
            size_bytes: 0,
            access: input.access,
            created_at: now,
            updated_at: now,
        };
        self.insert(&document).await?;
        tracing::info!(document_id = %document.id, mentor_id = %mentor_id, "Created document");
        Ok(document)
    }

    pub async fn get(&self, id: DocumentId) -> MentorResult<Document> {
        bounded(
            self.config.store_timeout,
            "documents.find",
            self.store.find_document(id),
        )
        .await?
        .ok_or_else(|| MentorError::not_found(Resource::Document, id))
    }

    async fn insert(&self, document: &Document) -> MentorResult<()> {
        bounded(
            self.config.store_timeout,
            "documents.insert",
            self.store.insert_document(document),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> UploadDocumentInput {
        UploadDocumentInput {
            title: "CV".into(),
            document_type: "cv".into(),
            file_name: "cv.pdf".into(),
            content: vec![1; 128],
            access: DocumentAccess::Private,
        }
    }

    #[test]
    fn test_upload_validation() {
        let config = MentorConfig {
            max_document_bytes: 256,
            ..MentorConfig::default()
        };
        assert!(upload().validate(&config).is_ok());

        let too_big = UploadDocumentInput {
            content: vec![0; 257],
            ..upload()
        };
        assert!(too_big.validate(&config).is_err());

        let empty = UploadDocumentInput {
            content: vec![],
            ..upload()
        };
        assert!(empty.validate(&config).is_err());

        let exe = UploadDocumentInput {
            file_name: "cv.exe".into(),
            ..upload()
        };
        assert!(exe.validate(&config).is_err());

        let traversal = UploadDocumentInput {
            file_name: "../cv.pdf".into(),
            ..upload()
        };
        assert!(traversal.validate(&config).is_err());
    }

    #[test]
    fn test_specific_mentees_needs_a_list() {
        let input = CreateDocumentInput {
            title: "Essay template".into(),
            document_type: "template".into(),
            url: None,
            access: DocumentAccess::SpecificMentees(vec![]),
        };
        assert!(input.validate(&MentorConfig::default()).is_err());

        let shared = CreateDocumentInput {
            access: DocumentAccess::SpecificMentees(vec![UserId::new()]),
            ..input
        };
        assert!(shared.validate(&MentorConfig::default()).is_ok());
    }

    #[test]
    fn test_url_scheme() {
        let input = CreateDocumentInput {
            title: "Template".into(),
            document_type: "template".into(),
            url: Some("javascript:alert(1)".into()),
            access: DocumentAccess::Public,
        };
        assert!(input.validate(&MentorConfig::default()).is_err());
    }
}
