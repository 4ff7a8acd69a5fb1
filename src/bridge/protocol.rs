//! Messages exchanged between the embedded page and the host shell.
//!
//! Frames are UTF-8 JSON text, tagged by `type`:
//!
//! ```json
//! {"type":"uploadRequest","source":"camera"}
//! {"type":"uploadResult","source":"storage","payload":{"kind":"file","mimeType":"application/pdf","data":"JVBERi0..."}}
//! {"type":"uploadResult","source":"camera","payload":null}
//! ```
//!
//! Older shells send the captured data flat (`"data": "data:image/png;base64,..."`)
//! or only a content `uri` the page cannot read; both shapes are still accepted.

use crate::models::{CaptureSource, CapturedPayload};
use crate::services::codec;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    /// Page -> Host: open the camera or the file picker.
    UploadRequest { source: CaptureSource },
    /// Host -> Page: the captured media, or `None` when the user backed out.
    UploadResult {
        source: CaptureSource,
        payload: Option<CapturedPayload>,
    },
}

impl BridgeMessage {
    pub fn request(source: CaptureSource) -> Self {
        BridgeMessage::UploadRequest { source }
    }

    pub fn result(source: CaptureSource, payload: Option<CapturedPayload>) -> Self {
        BridgeMessage::UploadResult { source, payload }
    }

    pub fn source(&self) -> CaptureSource {
        match self {
            BridgeMessage::UploadRequest { source } | BridgeMessage::UploadResult { source, .. } => {
                *source
            }
        }
    }

    /// Decodes one frame. A frame either parses completely or not at all.
    pub fn parse(text: &str) -> Result<Self, BridgeParseError> {
        serde_json::from_str(text).map_err(|source| BridgeParseError {
            frame_len: text.len(),
            source,
        })
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Error)]
#[error("malformed bridge message ({frame_len} bytes): {source}")]
pub struct BridgeParseError {
    pub frame_len: usize,
    pub source: serde_json::Error,
}

impl<'de> Deserialize<'de> for BridgeMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireMessage::deserialize(deserializer)?;
        BridgeMessage::try_from(wire).map_err(serde::de::Error::custom)
    }
}

/// Everything a frame may carry, before it is narrowed to a `BridgeMessage`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    source: CaptureSource,
    #[serde(default)]
    payload: Option<CapturedPayload>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

impl TryFrom<WireMessage> for BridgeMessage {
    type Error = String;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        match wire.kind.as_str() {
            "uploadRequest" => Ok(BridgeMessage::UploadRequest {
                source: wire.source,
            }),
            "uploadResult" => {
                // Empty data in either shape means nothing was selected.
                let payload = wire
                    .payload
                    .or_else(|| {
                        let data = wire.data?;
                        let mime_type = wire
                            .mime_type
                            .or_else(|| codec::split_data_uri(&data).0);
                        Some(CapturedPayload::new(wire.source.kind(), mime_type, data))
                    })
                    .filter(|p| !p.raw_base64.is_empty());

                if payload.is_none() && wire.uri.is_some() {
                    tracing::debug!(
                        source = %wire.source,
                        "Host sent a content URI without data; treating as nothing selected"
                    );
                }

                Ok(BridgeMessage::UploadResult {
                    source: wire.source,
                    payload,
                })
            }
            other => Err(format!("unknown message type {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    #[test]
    fn test_request_wire_format() {
        let text = BridgeMessage::request(CaptureSource::Camera).to_text().unwrap();
        assert_eq!(text, r#"{"type":"uploadRequest","source":"camera"}"#);
        assert_eq!(
            BridgeMessage::parse(&text).unwrap(),
            BridgeMessage::request(CaptureSource::Camera)
        );
    }

    #[test]
    fn test_result_with_payload() {
        let text = r#"{"type":"uploadResult","source":"storage","payload":{"kind":"file","encoding":"base64","mimeType":"application/pdf","data":"JVBERi0="}}"#;
        let message = BridgeMessage::parse(text).unwrap();
        assert_eq!(
            message,
            BridgeMessage::result(
                CaptureSource::Storage,
                Some(CapturedPayload::new(
                    MediaKind::File,
                    Some("application/pdf".into()),
                    "JVBERi0="
                ))
            )
        );
    }

    #[test]
    fn test_result_without_payload() {
        for text in [
            r#"{"type":"uploadResult","source":"camera","payload":null}"#,
            r#"{"type":"uploadResult","source":"camera"}"#,
            r#"{"type":"uploadResult","source":"camera","data":""}"#,
            r#"{"type":"uploadResult","source":"camera","payload":{"kind":"image","data":""}}"#,
        ] {
            assert_eq!(
                BridgeMessage::parse(text).unwrap(),
                BridgeMessage::result(CaptureSource::Camera, None)
            );
        }
    }

    #[test]
    fn test_flat_data_is_lifted_into_payload() {
        let text = r#"{"type":"uploadResult","source":"camera","data":"data:image/jpeg;base64,/9j/"}"#;
        let BridgeMessage::UploadResult { payload, .. } = BridgeMessage::parse(text).unwrap() else {
            panic!("expected a result");
        };
        let payload = payload.unwrap();
        assert_eq!(payload.kind, MediaKind::Image);
        assert_eq!(payload.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(payload.raw_base64, "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_uri_only_result_means_nothing_selected() {
        let text = r#"{"type":"uploadResult","source":"storage","uri":"content://media/42"}"#;
        assert_eq!(
            BridgeMessage::parse(text).unwrap(),
            BridgeMessage::result(CaptureSource::Storage, None)
        );
    }

    #[test]
    fn test_malformed_frames_are_rejected_whole() {
        for text in [
            "",
            "not json",
            "[1,2,3]",
            r#"{"type":"uploadResult"}"#,
            r#"{"type":"uploadResult","source":"gallery"}"#,
            r#"{"type":"shutdown","source":"camera"}"#,
            r#"{"type":"uploadResult","source":"camera","payload":{"kind":"video","data":"AAAA"}}"#,
        ] {
            let err = BridgeMessage::parse(text).unwrap_err();
            assert_eq!(err.frame_len, text.len());
        }
    }
}
