use crate::models::StoredAsset;
use async_trait::async_trait;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to prepare upload directory: {0}")]
    Directory(#[source] io::Error),

    #[error("failed to write upload: {0}")]
    Write(#[source] io::Error),

    #[error("invalid file name component: {0:?}")]
    InvalidName(String),
}

/// Persists decoded uploads.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Creates the backing location if needed. Safe to call repeatedly.
    async fn ensure_ready(&self) -> Result<(), StorageError>;

    /// Writes `bytes` under a freshly generated `{source_tag}_{token}.{extension}` name.
    async fn store(
        &self,
        bytes: &[u8],
        extension: &str,
        source_tag: &str,
    ) -> Result<StoredAsset, StorageError>;
}

/// Shared by every store in the process so names stay unique across instances.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Stores uploads as flat files in one directory.
pub struct LocalAssetStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Millisecond timestamp plus a process-wide sequence number, so two names
    /// generated in the same millisecond still differ.
    fn next_token(&self) -> String {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", Utc::now().timestamp_millis(), seq)
    }

    async fn write_atomically(&self, target: &Path, bytes: &[u8]) -> io::Result<()> {
        let staging = self.root.join(format!(".{}.part", Uuid::new_v4()));

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staging)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            // Fails with AlreadyExists instead of replacing an existing upload.
            tokio::fs::hard_link(&staging, target).await
        }
        .await;

        let _ = tokio::fs::remove_file(&staging).await;
        result
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(StorageError::Directory)
    }

    async fn store(
        &self,
        bytes: &[u8],
        extension: &str,
        source_tag: &str,
    ) -> Result<StoredAsset, StorageError> {
        check_component(source_tag, true)?;
        check_component(extension, false)?;

        self.ensure_ready().await?;

        let file_name = format!("{}_{}.{}", source_tag, self.next_token(), extension);
        let target = self.root.join(&file_name);

        self.write_atomically(&target, bytes)
            .await
            .map_err(StorageError::Write)?;

        tracing::info!(
            file_name = %file_name,
            size_bytes = bytes.len(),
            "💾 Stored upload"
        );

        Ok(StoredAsset {
            relative_path: format!("{}/{}", self.public_prefix, file_name),
            file_name,
            size_bytes: bytes.len() as u64,
        })
    }
}

/// Name components are system-chosen; anything outside `[a-z0-9-]` (plus `_` for
/// tags) is refused so a name can never leave the upload directory.
fn check_component(value: &str, allow_underscore: bool) -> Result<(), StorageError> {
    let valid = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || (allow_underscore && c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(value.to_string()))
    }
}
