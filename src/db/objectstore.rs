//! ObjectStore: the per-generation scratch-area collaborator (§6.4). Object
//! storage itself is out of scope (§1); this trait boundary plus a
//! local-filesystem default is shaped like the teacher's `StorageClient`
//! upload/download/delete trio, generalized from a single GCS bucket to a
//! `<base>/<user_id>/<generation_id>/` scratch tree.

use crate::error::CoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `relative_path` inside the generation's scratch
    /// area and return a client-facing URL-form path (forward slashes,
    /// leading `/`), per §6.4.
    async fn put(&self, user_id: &str, generation_id: &str, relative_path: &str, data: Vec<u8>) -> Result<String, CoreError>;

    /// Absolute filesystem path for a relative path inside the scratch
    /// area, used internally by the Stitcher and Synthesizer.
    fn resolve(&self, user_id: &str, generation_id: &str, relative_path: &str) -> PathBuf;

    /// Client-facing URL-form path for a file already written at
    /// `relative_path`, without re-writing it (§6.4). Used by the Stitcher,
    /// which writes its output directly to the resolved path via the
    /// encoder rather than through `put`.
    fn url_for(&self, user_id: &str, generation_id: &str, relative_path: &str) -> String;

    /// Delete the generation's entire scratch directory (used on
    /// cancellation/cleanup paths).
    async fn delete_generation(&self, user_id: &str, generation_id: &str) -> Result<(), CoreError>;
}

/// Default local-filesystem implementation rooted at `base_dir` (§6.4).
#[derive(Clone)]
pub struct LocalObjectStore {
    base_dir: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn generation_dir(&self, user_id: &str, generation_id: &str) -> PathBuf {
        self.base_dir.join(user_id).join(generation_id)
    }

    /// Derive the URL-form path surfaced to clients by stripping the base
    /// prefix and normalizing separators (§6.4).
    fn to_url_form(&self, absolute: &Path) -> String {
        let stripped = absolute.strip_prefix(&self.base_dir).unwrap_or(absolute);
        let forward = stripped.to_string_lossy().replace('\\', "/");
        format!("/{forward}")
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, user_id: &str, generation_id: &str, relative_path: &str, data: Vec<u8>) -> Result<String, CoreError> {
        let full_path = self.generation_dir(user_id, generation_id).join(relative_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, data).await?;
        Ok(self.to_url_form(&full_path))
    }

    fn resolve(&self, user_id: &str, generation_id: &str, relative_path: &str) -> PathBuf {
        self.generation_dir(user_id, generation_id).join(relative_path)
    }

    fn url_for(&self, user_id: &str, generation_id: &str, relative_path: &str) -> String {
        self.to_url_form(&self.generation_dir(user_id, generation_id).join(relative_path))
    }

    async fn delete_generation(&self, user_id: &str, generation_id: &str) -> Result<(), CoreError> {
        let dir = self.generation_dir(user_id, generation_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_resolve_round_trips() {
        let dir = tempfile_dir();
        let store = LocalObjectStore::new(&dir);
        let url = store.put("user-1", "gen-1", "reference_0_photo.jpg", vec![1, 2, 3]).await.unwrap();
        assert!(url.starts_with('/'));
        assert!(url.ends_with("reference_0_photo.jpg"));

        let resolved = store.resolve("user-1", "gen-1", "reference_0_photo.jpg");
        let contents = tokio::fs::read(&resolved).await.unwrap();
        assert_eq!(contents, vec![1, 2, 3]);

        store.delete_generation("user-1", "gen-1").await.unwrap();
        assert!(!resolved.exists());
    }

    fn tempfile_dir() -> PathBuf {
        std::env::temp_dir().join(format!("admint-test-{}", uuid::Uuid::new_v4()))
    }
}
