use crate::config::{PUBLIC_UPLOAD_PREFIX, ServerConfig};
use crate::services::store::{AssetStore, LocalAssetStore};
use std::sync::Arc;
use tracing::info;

/// Creates the upload directory if it is missing and returns the store over it.
pub async fn setup_storage(config: &ServerConfig) -> anyhow::Result<Arc<LocalAssetStore>> {
    let store = LocalAssetStore::new(&config.upload_dir, PUBLIC_UPLOAD_PREFIX);
    store.ensure_ready().await?;

    info!(
        "📁 Upload directory ready: {} (served at {})",
        config.upload_dir.display(),
        PUBLIC_UPLOAD_PREFIX
    );

    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::with_upload_dir(dir.path().join("uploads"));

        let store = setup_storage(&config).await.unwrap();
        assert!(store.root().is_dir());

        // Second start against the same directory.
        setup_storage(&config).await.unwrap();
    }
}
