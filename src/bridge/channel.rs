use super::protocol::{BridgeMessage, BridgeParseError};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no host bridge in this context")]
    Unavailable,

    #[error("host bridge disconnected")]
    Disconnected,

    #[error("failed to encode bridge message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of the page/host channel, injected into the page.
///
/// Sends are fire-and-forget: there is no acknowledgment and no reply value.
pub trait HostBridge: Send + Sync {
    /// `false` when the page runs outside a host shell.
    fn is_available(&self) -> bool {
        true
    }

    fn post(&self, message: &BridgeMessage) -> Result<(), BridgeError>;
}

/// Bridge for a page opened in a plain browser. Nothing is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBridge;

impl HostBridge for NoopBridge {
    fn is_available(&self) -> bool {
        false
    }

    fn post(&self, _message: &BridgeMessage) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }
}

/// Text frames to the host over an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    to_host: UnboundedSender<String>,
}

impl HostBridge for ChannelBridge {
    fn post(&self, message: &BridgeMessage) -> Result<(), BridgeError> {
        let text = message.to_text()?;
        self.to_host
            .send(text)
            .map_err(|_| BridgeError::Disconnected)
    }
}

/// Frames from the host, waiting for the page's handler.
pub type PageInbox = UnboundedReceiver<String>;

/// The host shell's side of the channel.
pub struct HostEndpoint {
    from_page: UnboundedReceiver<String>,
    to_page: UnboundedSender<String>,
}

impl HostEndpoint {
    /// Waits for the page's next frame. `None` once the page is gone.
    pub async fn next_request(&mut self) -> Option<Result<BridgeMessage, BridgeParseError>> {
        let text = self.from_page.recv().await?;
        Some(BridgeMessage::parse(&text))
    }

    pub fn try_next_request(&mut self) -> Option<Result<BridgeMessage, BridgeParseError>> {
        let text = self.from_page.try_recv().ok()?;
        Some(BridgeMessage::parse(&text))
    }

    pub fn reply(&self, message: &BridgeMessage) -> Result<(), BridgeError> {
        self.send_text(message.to_text()?)
    }

    /// Sends an arbitrary frame, well-formed or not.
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), BridgeError> {
        self.to_page
            .send(text.into())
            .map_err(|_| BridgeError::Disconnected)
    }
}

/// Wires a page to a host: the page posts through the bridge and reads replies
/// from the inbox; the host owns the other ends.
pub fn connect() -> (ChannelBridge, PageInbox, HostEndpoint) {
    let (to_host, from_page) = mpsc::unbounded_channel();
    let (to_page, inbox) = mpsc::unbounded_channel();
    (
        ChannelBridge { to_host },
        inbox,
        HostEndpoint { from_page, to_page },
    )
}
