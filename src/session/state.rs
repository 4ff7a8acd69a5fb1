use crate::bridge::BridgeMessage;
use crate::models::{CaptureSource, CapturedPayload, MediaKind, UploadMediaRequest, UploadMediaResponse};
use crate::session::client::NetworkError;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    AwaitingCapture,
    Previewing,
    Uploading,
    Succeeded,
    Failed,
}

/// Proof that an upload was started. Exactly one exists while the session is
/// `Uploading`; it is consumed by [`UploadSession::finish_upload`].
#[derive(Debug)]
pub struct UploadTicket {
    generation: u64,
    kind: MediaKind,
    request: UploadMediaRequest,
}

impl UploadTicket {
    pub fn request(&self) -> &UploadMediaRequest {
        &self.request
    }
}

/// Page-side capture/upload lifecycle for one page load.
///
/// Holds at most one pending payload; every new capture result replaces it.
#[derive(Debug)]
pub struct UploadSession {
    payload: Option<CapturedPayload>,
    /// Bumped on every new payload so a finished upload only clears what it sent.
    generation: u64,
    status: SessionStatus,
    last_error: Option<String>,
    status_message: String,
    last_file_path: Option<String>,
    settled_at: Option<Instant>,
    display_window: Duration,
}

impl UploadSession {
    pub fn new(display_window: Duration) -> Self {
        Self {
            payload: None,
            generation: 0,
            status: SessionStatus::Idle,
            last_error: None,
            status_message: String::new(),
            last_file_path: None,
            settled_at: None,
            display_window,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&CapturedPayload> {
        self.payload.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Text shown to the user under the upload button.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Retrievable path of the most recent successful upload.
    pub fn last_file_path(&self) -> Option<&str> {
        self.last_file_path.as_deref()
    }

    /// Whether the upload trigger is enabled.
    pub fn can_upload(&self) -> bool {
        self.payload.is_some() && self.status != SessionStatus::Uploading
    }

    pub fn can_request_capture(&self) -> bool {
        self.status != SessionStatus::Uploading
    }

    /// Records that a capture request went out to the host.
    pub fn capture_requested(&mut self, source: CaptureSource) -> bool {
        if !self.can_request_capture() {
            return false;
        }
        self.status = SessionStatus::AwaitingCapture;
        self.last_error = None;
        self.settled_at = None;
        self.status_message = match source {
            CaptureSource::Camera => "Opening camera...",
            CaptureSource::Storage => "Opening file picker...",
        }
        .to_string();
        true
    }

    /// The page cannot reach a host, so nothing changes except the message.
    pub fn bridge_unavailable(&mut self, source: CaptureSource) {
        self.status_message = match source {
            CaptureSource::Camera => "Camera functionality not available in this context.",
            CaptureSource::Storage => "Storage functionality not available in this context.",
        }
        .to_string();
    }

    /// Applies a message from the host. Results are accepted whether or not a
    /// request is outstanding and whatever source was last requested.
    pub fn apply(&mut self, message: BridgeMessage) {
        let BridgeMessage::UploadResult { source, payload } = message else {
            tracing::debug!("Ignoring page-bound upload request");
            return;
        };

        match payload {
            Some(payload) => {
                self.payload = Some(payload);
                self.generation += 1;
                if self.status == SessionStatus::Uploading {
                    // Keeps the in-flight upload; the new payload waits for its turn.
                    return;
                }
                self.status = SessionStatus::Previewing;
                self.last_error = None;
                self.settled_at = None;
                self.status_message = match source {
                    CaptureSource::Camera => String::new(),
                    CaptureSource::Storage => "File selected.".to_string(),
                };
            }
            None => {
                if self.status == SessionStatus::Uploading {
                    return;
                }
                self.reset(String::new());
            }
        }
    }

    /// A frame from the host could not be parsed.
    pub fn reject_malformed(&mut self) {
        if self.status == SessionStatus::Uploading {
            tracing::warn!("Discarded malformed bridge message during upload");
            return;
        }
        self.reset("Error processing data.".to_string());
    }

    /// Starts an upload of the pending payload. Returns `None`, changing nothing
    /// but the message, when there is nothing to send or an upload is in flight.
    pub fn begin_upload(&mut self) -> Option<UploadTicket> {
        if self.status == SessionStatus::Uploading {
            return None;
        }
        let Some(payload) = &self.payload else {
            self.status_message = "No image or file selected for upload.".to_string();
            return None;
        };

        let ticket = UploadTicket {
            generation: self.generation,
            kind: payload.kind,
            request: UploadMediaRequest::from_payload(payload),
        };

        self.status = SessionStatus::Uploading;
        self.last_error = None;
        self.settled_at = None;
        self.status_message = match ticket.kind {
            MediaKind::Image => "Uploading image...",
            MediaKind::File => "Uploading file...",
        }
        .to_string();

        Some(ticket)
    }

    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadMediaResponse, NetworkError>,
        now: Instant,
    ) {
        self.settled_at = Some(now);
        match result {
            Ok(response) => {
                if self.generation == ticket.generation {
                    self.payload = None;
                }
                self.status = SessionStatus::Succeeded;
                self.last_error = None;
                self.last_file_path = Some(response.file_path);
                self.status_message = match ticket.kind {
                    MediaKind::Image => "Image uploaded successfully!",
                    MediaKind::File => "File uploaded successfully!",
                }
                .to_string();
            }
            Err(e) => {
                tracing::warn!("Upload failed: {}", e);
                self.status = SessionStatus::Failed;
                self.status_message = format!("Upload failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Ends the success/failure display once its window has passed.
    ///
    /// A payload that arrived during the upload goes straight to preview;
    /// otherwise the session is idle, a failed payload kept for retry.
    pub fn tick(&mut self, now: Instant) {
        let Some(settled_at) = self.settled_at else {
            return;
        };
        if now.duration_since(settled_at) < self.display_window {
            return;
        }
        self.settled_at = None;
        self.status_message.clear();
        self.status = match self.status {
            SessionStatus::Succeeded if self.payload.is_some() => SessionStatus::Previewing,
            SessionStatus::Succeeded | SessionStatus::Failed => SessionStatus::Idle,
            other => other,
        };
    }

    fn reset(&mut self, status_message: String) {
        self.payload = None;
        self.generation += 1;
        self.status = SessionStatus::Idle;
        self.last_error = None;
        self.settled_at = None;
        self.status_message = status_message;
    }
}
