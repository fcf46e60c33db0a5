use std::fmt;
use thiserror::Error;

/// Failures of the signaling transport. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Server unreachable or address malformed. The caller decides whether to retry.
    #[error("failed to connect to signaling server at {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("signaling channel is closed")]
    Closed,

    #[error("failed to encode '{event}' message: {reason}")]
    Encode { event: &'static str, reason: String },
}

/// A media-engine operation that failed or did not finish in time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{op} failed: {reason}")]
    Operation { op: &'static str, reason: String },

    #[error("{op} timed out")]
    TimedOut { op: &'static str },
}

impl EngineError {
    pub fn operation(op: &'static str, reason: impl fmt::Display) -> Self {
        Self::Operation {
            op,
            reason: reason.to_string(),
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            Self::Operation { op, .. } | Self::TimedOut { op } => op,
        }
    }
}

/// Recoverable errors handed to the [`SessionListener`](crate::SessionListener).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A signaling payload was missing a field or carried the wrong shape; it was dropped.
    #[error("malformed '{event}' message: {reason}")]
    Malformed { event: String, reason: String },

    /// Offer/answer creation or a description set failed.
    #[error("negotiation failed: {0}")]
    Negotiation(EngineError),

    /// Local capture or track control failed.
    #[error("local media failed: {0}")]
    Media(EngineError),

    /// The session task is gone; commands can no longer be delivered.
    #[error("session has stopped")]
    Stopped,
}
