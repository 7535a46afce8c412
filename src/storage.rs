use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Durable home of uploaded workbook bytes.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Stores `body` under `key` and returns the location to read it back from.
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<String>;
    async fn get_object(&self, location: &str) -> anyhow::Result<Bytes>;
    async fn delete_object(&self, location: &str) -> anyhow::Result<()>;
}

/// Keeps objects as plain files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<String> {
        anyhow::ensure!(
            !key.is_empty() && !key.contains(['/', '\\']) && key != "." && key != "..",
            "invalid object key {key:?}"
        );
        let path = self.root.join(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn get_object(&self, location: &str) -> anyhow::Result<Bytes> {
        let data = tokio::fs::read(location)
            .await
            .with_context(|| format!("read {location}"))?;
        Ok(Bytes::from(data))
    }

    async fn delete_object(&self, location: &str) -> anyhow::Result<()> {
        tokio::fs::remove_file(location)
            .await
            .with_context(|| format!("remove {location}"))?;
        Ok(())
    }
}
