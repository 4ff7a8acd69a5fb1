use crate::api::error::AppError;
use crate::models::{CaptureSource, StoredAsset};
use crate::services::codec::{self, DecodedPayload};
use crate::services::store::AssetStore;
use std::sync::Arc;

/// Decodes captured media and hands it to the store. Both capture sources go
/// through the same path.
pub struct MediaService {
    store: Arc<dyn AssetStore>,
}

impl MediaService {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, source: CaptureSource, data: &str) -> Result<StoredAsset, AppError> {
        let decoded = codec::decode(data)?;
        let extension = resolve_extension(&decoded, source).to_string();

        tracing::debug!(
            source = %source,
            mime_type = ?decoded.mime_type,
            extension = %extension,
            size_bytes = decoded.bytes.len(),
            "Decoded upload"
        );

        let asset = self
            .store
            .store(&decoded.bytes, &extension, source.as_str())
            .await?;
        Ok(asset)
    }
}

/// Data-URI MIME type first, then magic bytes, then the source's fixed fallback.
pub fn resolve_extension(decoded: &DecodedPayload, source: CaptureSource) -> &str {
    decoded
        .extension
        .as_deref()
        .or_else(|| decoded.sniffed_extension())
        .unwrap_or(source.fallback_extension())
}
