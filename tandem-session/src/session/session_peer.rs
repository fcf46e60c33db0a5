use crate::engine::{EngineConnectionState, Generation, PeerConnection};
use std::fmt;
use tokio::time::Instant;

/// Connection status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Disconnected => "DISCONNECTED",
        }
    }

    /// The only transitions the engine can drive. `None` means the signal
    /// does not move the state.
    pub(crate) fn on_engine_signal(self, signal: EngineConnectionState) -> Option<Self> {
        match (self, signal) {
            (Self::Connecting, EngineConnectionState::Connected) => Some(Self::Connected),
            (Self::Connecting | Self::Connected, EngineConnectionState::Disconnected) => {
                Some(Self::Disconnected)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offerer,
    Answerer,
}

impl NegotiationRole {
    /// The engine call that produces this role's local description.
    pub(crate) fn create_op(&self) -> &'static str {
        match self {
            Self::Offerer => "create_offer",
            Self::Answerer => "create_answer",
        }
    }
}

impl fmt::Display for NegotiationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offerer => f.write_str("offerer"),
            Self::Answerer => f.write_str("answerer"),
        }
    }
}

/// The single active negotiation context.
pub(crate) struct SessionPeer {
    pub(crate) generation: Generation,
    pub(crate) role: NegotiationRole,
    pub(crate) status: ConnectionStatus,
    /// Gates candidate application.
    pub(crate) remote_description_set: bool,
    pub(crate) removal_announced: bool,
    /// Set while a requested offer/answer has not come back from the engine.
    pub(crate) description_deadline: Option<Instant>,
    pub(crate) connection: Box<dyn PeerConnection>,
}

impl SessionPeer {
    pub(crate) fn new(
        generation: Generation,
        role: NegotiationRole,
        connection: Box<dyn PeerConnection>,
    ) -> Self {
        Self {
            generation,
            role,
            status: ConnectionStatus::Connecting,
            remote_description_set: false,
            removal_announced: false,
            description_deadline: None,
            connection,
        }
    }
}
