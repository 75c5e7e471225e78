//! File storage under per-project namespaces. Bytes land beneath one asset
//! root on disk; records live in `uploaded_files` and the public URL is
//! served back by the `/files` route.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Key for a project-level document upload.
    pub fn project_document_key(project_id: Uuid, filename: &str) -> String {
        format!(
            "project-documents/{project_id}/{}_{}",
            Uuid::new_v4(),
            sanitize_filename(filename)
        )
    }

    /// Key for a workflow step upload.
    pub fn workflow_key(project_id: Uuid, step_id: &str, filename: &str) -> String {
        format!(
            "workflows/{project_id}/{}/{}_{}",
            sanitize_filename(step_id),
            Uuid::new_v4(),
            sanitize_filename(filename)
        )
    }

    /// Where a stored key is served from.
    pub fn public_url(key: &str) -> String {
        format!("/files/{key}")
    }

    pub async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key = %key, size = bytes.len(), "Stored file");
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Map a key onto the asset root, rejecting anything that could step
    /// outside it.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.starts_with('/')
            || key
                .split('/')
                .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(Path::new(key)))
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_project() {
        let project_id = Uuid::new_v4();
        let key = FileStorage::project_document_key(project_id, "the brief.pdf");
        assert!(key.starts_with(&format!("project-documents/{project_id}/")));
        assert!(key.ends_with("the_brief.pdf"));

        let key = FileStorage::workflow_key(project_id, "brand_guidelines", "logo.svg");
        assert!(key.starts_with(&format!("workflows/{project_id}/brand_guidelines/")));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let storage = FileStorage::new("/tmp/assets");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("a/../../b").is_err());
        assert!(storage.resolve("/absolute").is_err());
        assert!(storage.resolve("a//b").is_err());
        assert!(storage.resolve("project-documents/p/file.pdf").is_ok());
    }

    #[tokio::test]
    async fn store_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let key = FileStorage::project_document_key(Uuid::new_v4(), "brief.pdf");

        storage.store(&key, b"hello").await.unwrap();
        assert_eq!(storage.read(&key).await.unwrap(), b"hello");
    }

    #[test]
    fn hostile_filenames_are_flattened() {
        assert_eq!(sanitize_filename("../../x"), ".._.._x");
        assert_eq!(sanitize_filename("..."), "file");
        assert_eq!(sanitize_filename("report v2.pdf"), "report_v2.pdf");
    }
}
