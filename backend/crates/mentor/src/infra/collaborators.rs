//! Notification and file storage collaborators

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::domain::ports::{
    FileStorage, FileStorageError, NotificationDispatcher, NotificationError, NotificationEvent,
};

/// Logs each event; delivery is handled elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationDispatcher for TracingNotifier {
    fn dispatch<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> BoxFuture<'a, Result<(), NotificationError>> {
        async move {
            tracing::info!(
                kind = %event.kind,
                subject_id = %event.subject_id,
                recipients = event.recipients.len(),
                "Notification dispatched"
            );
            Ok(())
        }
        .boxed()
    }
}

/// Keeps every dispatched event; can be switched to fail
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().await.clone()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn dispatch<'a>(
        &'a self,
        event: &'a NotificationEvent,
    ) -> BoxFuture<'a, Result<(), NotificationError>> {
        async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(NotificationError("recipient mailbox unavailable".into()));
            }
            self.events.lock().await.push(event.clone());
            Ok(())
        }
        .boxed()
    }
}

/// File storage on the local filesystem under `root`
///
/// Paths are relative and may not leave `root`. The returned URL is
/// `base_url/path`; the server publishes `root` under that prefix.
pub struct LocalFileStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FileStorageError> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if path.is_empty() || !contained {
            return Err(FileStorageError(format!("invalid storage path {path:?}")));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStorage for LocalFileStorage {
    fn put<'a>(
        &'a self,
        path: &'a str,
        content: &'a [u8],
    ) -> BoxFuture<'a, Result<String, FileStorageError>> {
        async move {
            let target = self.resolve(path)?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| FileStorageError(format!("{}: {err}", parent.display())))?;
            }
            tokio::fs::write(&target, content)
                .await
                .map_err(|err| FileStorageError(format!("{}: {err}", target.display())))?;
            tracing::debug!(path = %target.display(), bytes = content.len(), "Stored file");
            Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
        }
        .boxed()
    }
}

/// File storage kept in process memory
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: DashMap<String, Vec<u8>>,
    base_url: String,
    failing: AtomicBool,
}

impl InMemoryFileStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).map(|f| f.clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileStorage for InMemoryFileStorage {
    fn put<'a>(
        &'a self,
        path: &'a str,
        content: &'a [u8],
    ) -> BoxFuture<'a, Result<String, FileStorageError>> {
        async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(FileStorageError("bucket unavailable".into()));
            }
            self.files.insert(path.to_string(), content.to_vec());
            Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_storage_returns_url() {
        let storage = InMemoryFileStorage::new("memory://files/");
        let url = storage.put("documents/a/cv.pdf", b"%PDF").await.unwrap();
        assert_eq!(url, "memory://files/documents/a/cv.pdf");
        assert_eq!(storage.get("documents/a/cv.pdf").unwrap(), b"%PDF");
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mentor-files-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_local_storage_writes_under_root() {
        let root = scratch_dir();
        let storage = LocalFileStorage::new(&root, "http://localhost:31113/files/");

        let url = storage.put("documents/a/cv.pdf", b"%PDF").await.unwrap();
        assert_eq!(url, "http://localhost:31113/files/documents/a/cv.pdf");
        let written = tokio::fs::read(root.join("documents/a/cv.pdf")).await.unwrap();
        assert_eq!(written, b"%PDF");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage_rejects_escaping_paths() {
        let root = scratch_dir();
        let storage = LocalFileStorage::new(&root, "http://localhost/files");

        for path in ["../cv.pdf", "/etc/passwd", "documents/../../cv.pdf", ""] {
            assert!(storage.put(path, b"1").await.is_err(), "{path}");
        }
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_failing_storage() {
        let storage = InMemoryFileStorage::new("memory://files");
        storage.fail(true);
        assert!(storage.put("x.pdf", b"1").await.is_err());
        assert!(storage.is_empty());
    }
}
