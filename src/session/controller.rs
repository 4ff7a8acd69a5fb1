use crate::bridge::{BridgeMessage, HostBridge, PageInbox};
use crate::config::SessionConfig;
use crate::models::CaptureSource;
use crate::session::client::UploadClient;
use crate::session::state::UploadSession;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Drives one page's [`UploadSession`]: posts capture requests through the
/// injected bridge, is the single handler for host frames, and runs uploads.
pub struct SessionController {
    session: UploadSession,
    bridge: Arc<dyn HostBridge>,
    client: Arc<dyn UploadClient>,
    inbox: Option<PageInbox>,
}

impl SessionController {
    pub fn new(
        bridge: Arc<dyn HostBridge>,
        client: Arc<dyn UploadClient>,
        inbox: Option<PageInbox>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            session: UploadSession::new(config.display_window),
            bridge,
            client,
            inbox,
        }
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn open_camera(&mut self) -> bool {
        self.request_capture(CaptureSource::Camera)
    }

    pub fn choose_file(&mut self) -> bool {
        self.request_capture(CaptureSource::Storage)
    }

    /// Asks the host for media. Returns as soon as the request is posted.
    pub fn request_capture(&mut self, source: CaptureSource) -> bool {
        if !self.bridge.is_available() {
            self.session.bridge_unavailable(source);
            return false;
        }
        if !self.session.can_request_capture() {
            return false;
        }

        match self.bridge.post(&BridgeMessage::request(source)) {
            Ok(()) => self.session.capture_requested(source),
            Err(e) => {
                warn!(source = %source, "Failed to post capture request: {}", e);
                self.session.bridge_unavailable(source);
                false
            }
        }
    }

    /// Handles one frame from the host. Malformed frames never escape as errors.
    pub fn handle_host_message(&mut self, text: &str) {
        match BridgeMessage::parse(text) {
            Ok(message) => {
                info!(source = %message.source(), "📨 Bridge message received");
                self.session.apply(message);
            }
            Err(e) => {
                warn!(frame_len = e.frame_len, "Discarding bridge message: {}", e);
                self.session.reject_malformed();
            }
        }
    }

    /// Handles every frame already waiting in the inbox.
    pub fn drain_inbox(&mut self) -> usize {
        let mut frames = Vec::new();
        if let Some(inbox) = self.inbox.as_mut() {
            while let Ok(text) = inbox.try_recv() {
                frames.push(text);
            }
        }
        for text in &frames {
            self.handle_host_message(text);
        }
        frames.len()
    }

    /// Waits for the next host frame and handles it. `false` once the host is gone.
    pub async fn next_host_message(&mut self) -> bool {
        let Some(inbox) = self.inbox.as_mut() else {
            return false;
        };
        match inbox.recv().await {
            Some(text) => {
                self.handle_host_message(&text);
                true
            }
            None => false,
        }
    }

    /// Uploads the pending payload. A no-op without one; `&mut self` is held
    /// until the response arrives, so a second upload cannot start meanwhile.
    pub async fn upload(&mut self) -> bool {
        let Some(ticket) = self.session.begin_upload() else {
            return false;
        };

        let result = self.client.upload(ticket.request()).await;
        let succeeded = result.is_ok();
        if let Ok(response) = &result {
            info!(file_path = %response.file_path, "✅ Upload stored");
        }
        self.session.finish_upload(ticket, result, Instant::now());
        succeeded
    }

    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{NoopBridge, connect};
    use crate::models::{UploadMediaRequest, UploadMediaResponse};
    use crate::session::client::NetworkError;
    use crate::session::state::SessionStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        fail: bool,
        sent: Mutex<Vec<UploadMediaRequest>>,
    }

    #[async_trait]
    impl UploadClient for RecordingClient {
        async fn upload(
            &self,
            request: &UploadMediaRequest,
        ) -> Result<UploadMediaResponse, NetworkError> {
            self.sent.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(NetworkError::Unreachable("connection refused".into()));
            }
            Ok(UploadMediaResponse {
                message: "ok".into(),
                file_path: "/uploads/camera_1-0.png".into(),
                file_name: "camera_1-0.png".into(),
                size_bytes: 3,
            })
        }
    }

    #[test]
    fn test_standalone_page_reports_missing_bridge() {
        let client = Arc::new(RecordingClient::default());
        let mut controller =
            SessionController::new(Arc::new(NoopBridge), client, None, &SessionConfig::default());

        assert!(!controller.open_camera());
        assert_eq!(controller.session().status(), SessionStatus::Idle);
        assert_eq!(
            controller.session().status_message(),
            "Camera functionality not available in this context."
        );
        assert!(!controller.choose_file());
        assert_eq!(
            controller.session().status_message(),
            "Storage functionality not available in this context."
        );
    }

    #[tokio::test]
    async fn test_capture_then_upload() {
        let (bridge, inbox, mut host) = connect();
        let client = Arc::new(RecordingClient::default());
        let mut controller = SessionController::new(
            Arc::new(bridge),
            client.clone(),
            Some(inbox),
            &SessionConfig::default(),
        );

        assert!(controller.open_camera());
        let request = host.next_request().await.unwrap().unwrap();
        assert_eq!(request, BridgeMessage::request(CaptureSource::Camera));

        host.send_text(r#"{"type":"uploadResult","source":"camera","data":"data:image/png;base64,AAAA"}"#)
            .unwrap();
        assert!(controller.next_host_message().await);
        assert_eq!(controller.session().status(), SessionStatus::Previewing);

        assert!(controller.upload().await);
        assert_eq!(controller.session().status(), SessionStatus::Succeeded);
        assert!(controller.session().payload().is_none());

        let sent = client.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_payload() {
        let (bridge, inbox, host) = connect();
        let client = Arc::new(RecordingClient {
            fail: true,
            ..Default::default()
        });
        let mut controller = SessionController::new(
            Arc::new(bridge),
            client.clone(),
            Some(inbox),
            &SessionConfig::default(),
        );

        host.send_text(r#"{"type":"uploadResult","source":"storage","data":"JVBERi0="}"#)
            .unwrap();
        assert_eq!(controller.drain_inbox(), 1);

        assert!(!controller.upload().await);
        assert_eq!(controller.session().status(), SessionStatus::Failed);
        assert!(controller.session().payload().is_some());
        assert!(controller.session().last_error().is_some());
    }

    #[tokio::test]
    async fn test_upload_without_payload_sends_nothing() {
        let client = Arc::new(RecordingClient::default());
        let mut controller = SessionController::new(
            Arc::new(NoopBridge),
            client.clone(),
            None,
            &SessionConfig::default(),
        );
        assert!(!controller.upload().await);
        assert!(client.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_capture_request_refused_while_uploading_posts_nothing() {
        let (bridge, inbox, mut host) = connect();
        let mut controller = SessionController::new(
            Arc::new(bridge),
            Arc::new(RecordingClient::default()),
            Some(inbox),
            &SessionConfig::default(),
        );

        assert!(controller.choose_file());
        assert_eq!(
            host.try_next_request().unwrap().unwrap(),
            BridgeMessage::request(CaptureSource::Storage)
        );
        assert!(host.try_next_request().is_none());

        host.send_text(r#"{"type":"uploadResult","source":"storage","data":"JVBERi0="}"#)
            .unwrap();
        controller.drain_inbox();
        let _ticket = controller.session.begin_upload().unwrap();

        assert!(!controller.open_camera());
        assert!(host.try_next_request().is_none());
        assert_eq!(controller.session().status(), SessionStatus::Uploading);
    }

    #[test]
    fn test_garbage_frames_are_absorbed() {
        let (bridge, inbox, host) = connect();
        let mut controller = SessionController::new(
            Arc::new(bridge),
            Arc::new(RecordingClient::default()),
            Some(inbox),
            &SessionConfig::default(),
        );

        host.send_text(r#"{"type":"uploadResult","source":"camera","data":"AAAA"}"#)
            .unwrap();
        host.send_text("{not json").unwrap();
        assert_eq!(controller.drain_inbox(), 2);

        assert_eq!(controller.session().status(), SessionStatus::Idle);
        assert!(controller.session().payload().is_none());
        assert_eq!(controller.session().status_message(), "Error processing data.");
    }
}
