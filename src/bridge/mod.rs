pub mod channel;
pub mod protocol;

pub use channel::{BridgeError, ChannelBridge, HostBridge, HostEndpoint, NoopBridge, PageInbox, connect};
pub use protocol::{BridgeMessage, BridgeParseError};
