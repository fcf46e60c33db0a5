use crate::error::ChannelError;
use async_trait::async_trait;
use tandem_core::SignalMessage;

/// Everything the channel delivers to the session, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Transport is up; always the first event.
    Connected,

    Message(SignalMessage),

    /// A known event arrived with a payload that could not be decoded.
    Malformed { event: String, reason: String },

    /// Transport is gone. Sent exactly once and always last.
    Disconnected,
}

/// Outbound half of the duplex link to the signaling server.
///
/// Inbound traffic is not pulled through this trait: whoever opens the channel
/// hands the matching `mpsc::Receiver<ChannelEvent>` to the session.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Fire-and-forget; there is no acknowledgement from the server.
    async fn emit(&self, msg: SignalMessage) -> Result<(), ChannelError>;

    /// Asks the transport to shut down. `Disconnected` follows on the event stream.
    async fn close(&self);
}
