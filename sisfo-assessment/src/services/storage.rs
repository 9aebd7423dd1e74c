//! File storage collaborator for rendered report cards

use async_trait::async_trait;
use sisfo_common::{Error, Result};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Object storage seen by the report-card engine
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under `path` and return its public URL
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String>;

    /// Delete the object at `path`; a missing object is not an error
    async fn remove(&self, path: &str) -> Result<()>;

    /// Public URL of `path` without touching storage
    fn url_for(&self, path: &str) -> String;
}

/// Object path of a report card PDF
pub fn report_card_path(tenant: &str, report_card_id: Uuid) -> String {
    format!("report_cards/{}/{}.pdf", tenant, report_card_id)
}

/// Local-disk storage served under a base URL
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path below the root, refusing escapes
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::FileStorage(format!("invalid object path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::FileStorage(format!("create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| Error::FileStorage(format!("write {}: {}", target.display(), e)))?;

        tracing::debug!(path = %path, size = bytes.len(), "file stored");
        Ok(self.url_for(path))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                tracing::debug!(path = %path, "file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::FileStorage(format!("remove {}: {}", target.display(), e))),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_card_path() {
        let id = Uuid::nil();
        assert_eq!(
            report_card_path("school-1", id),
            "report_cards/school-1/00000000-0000-0000-0000-000000000000.pdf"
        );
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:9093/files/");

        let url = storage
            .upload("report_cards/t1/card.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:9093/files/report_cards/t1/card.pdf");
        let stored = std::fs::read(dir.path().join("report_cards/t1/card.pdf")).unwrap();
        assert_eq!(stored, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://files");

        for bad in ["../outside.pdf", "/etc/passwd", "", "a/../../b"] {
            let result = storage.upload(bad, Vec::new()).await;
            assert!(matches!(result, Err(Error::FileStorage(_))), "accepted {:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_remove_deletes_file_and_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://files");
        storage.upload("report_cards/t1/card.pdf", b"%PDF".to_vec()).await.unwrap();

        storage.remove("report_cards/t1/card.pdf").await.unwrap();
        assert!(!dir.path().join("report_cards/t1/card.pdf").exists());

        storage.remove("report_cards/t1/card.pdf").await.unwrap();
        assert!(matches!(storage.remove("../card.pdf").await, Err(Error::FileStorage(_))));
    }
}
