use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Where the host obtained a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Storage,
}

impl CaptureSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureSource::Camera => "camera",
            CaptureSource::Storage => "storage",
        }
    }

    /// The kind of media a source produces.
    pub fn kind(&self) -> MediaKind {
        match self {
            CaptureSource::Camera => MediaKind::Image,
            CaptureSource::Storage => MediaKind::File,
        }
    }

    /// Extension used when neither the MIME type nor the content identify the payload.
    /// The camera encoder always emits PNG.
    pub fn fallback_extension(&self) -> &'static str {
        match self {
            CaptureSource::Camera => "png",
            CaptureSource::Storage => "bin",
        }
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    File,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::File => "file",
        }
    }

    /// The only source that produces this kind.
    pub fn source(&self) -> CaptureSource {
        match self {
            MediaKind::Image => CaptureSource::Camera,
            MediaKind::File => CaptureSource::Storage,
        }
    }

    /// Pairs a kind with a source, accepting only `image+camera` and `file+storage`.
    pub fn classify(kind: &str, source: &str) -> Option<(MediaKind, CaptureSource)> {
        match (kind, source) {
            ("image", "camera") => Some((MediaKind::Image, CaptureSource::Camera)),
            ("file", "storage") => Some((MediaKind::File, CaptureSource::Storage)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Base64,
}

/// Media handed over by the host after a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPayload {
    pub kind: MediaKind,
    #[serde(default)]
    pub encoding: PayloadEncoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Bare base64 or a full data URI.
    #[serde(rename = "data")]
    pub raw_base64: String,
}

impl CapturedPayload {
    pub fn new(kind: MediaKind, mime_type: Option<String>, raw_base64: impl Into<String>) -> Self {
        Self {
            kind,
            encoding: PayloadEncoding::Base64,
            mime_type,
            raw_base64: raw_base64.into(),
        }
    }

    /// The payload as a data URI, suitable for an `<img src>` preview.
    pub fn preview_uri(&self) -> String {
        if self.raw_base64.starts_with("data:") {
            return self.raw_base64.clone();
        }
        let mime = self
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        format!("data:{};base64,{}", mime, self.raw_base64)
    }

    /// Body for the upload endpoint: data URIs pass through, bare base64 gets a
    /// data-URI header when the host told us the MIME type.
    pub fn upload_data(&self) -> String {
        match &self.mime_type {
            Some(_) if !self.raw_base64.starts_with("data:") => self.preview_uri(),
            _ => self.raw_base64.clone(),
        }
    }
}

/// A file written by the upload store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    pub file_name: String,
    /// Path relative to the server root, e.g. `/uploads/camera_1700000000000-1.png`.
    pub relative_path: String,
    pub size_bytes: u64,
}

/// JSON body of `POST /upload-media`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMediaRequest {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub source: CaptureSource,
    pub data: String,
}

impl UploadMediaRequest {
    pub fn from_payload(payload: &CapturedPayload) -> Self {
        Self {
            kind: payload.kind,
            source: payload.kind.source(),
            data: payload.upload_data(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMediaResponse {
    pub message: String,
    /// Retrievable path, e.g. `/uploads/camera_1700000000000-0.png`.
    pub file_path: String,
    pub file_name: String,
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_accepts_only_known_pairs() {
        assert_eq!(
            MediaKind::classify("image", "camera"),
            Some((MediaKind::Image, CaptureSource::Camera))
        );
        assert_eq!(
            MediaKind::classify("file", "storage"),
            Some((MediaKind::File, CaptureSource::Storage))
        );
        assert_eq!(MediaKind::classify("image", "storage"), None);
        assert_eq!(MediaKind::classify("file", "camera"), None);
        assert_eq!(MediaKind::classify("bogus", "camera"), None);
    }

    #[test]
    fn test_payload_serializes_with_wire_names() {
        let payload = CapturedPayload::new(MediaKind::Image, Some("image/png".into()), "AAAA");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["encoding"], "base64");
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["data"], "AAAA");
    }

    #[test]
    fn test_preview_uri() {
        let bare = CapturedPayload::new(MediaKind::Image, Some("image/jpeg".into()), "AAAA");
        assert_eq!(bare.preview_uri(), "data:image/jpeg;base64,AAAA");

        let uri = CapturedPayload::new(MediaKind::Image, None, "data:image/png;base64,AAAA");
        assert_eq!(uri.preview_uri(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_upload_request_from_payload() {
        let file = CapturedPayload::new(MediaKind::File, Some("application/pdf".into()), "JVBERi0=");
        let request = UploadMediaRequest::from_payload(&file);
        assert_eq!(request.source, CaptureSource::Storage);
        assert_eq!(request.data, "data:application/pdf;base64,JVBERi0=");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["source"], "storage");

        let bare = CapturedPayload::new(MediaKind::File, None, "JVBERi0=");
        assert_eq!(UploadMediaRequest::from_payload(&bare).data, "JVBERi0=");
    }

    #[test]
    fn test_hostile_mime_type_still_decodes() {
        let payload = CapturedPayload::new(MediaKind::Image, Some("image/png;base64,junk".into()), "AAAA");
        let request = UploadMediaRequest::from_payload(&payload);

        let decoded = crate::services::codec::decode(&request.data).unwrap();
        assert_eq!(decoded.bytes, vec![0u8, 0, 0]);
        assert_eq!(decoded.extension.as_deref(), Some("png"));
    }
}
