use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::SignalMessage;
use tandem_session::{ChannelError, SignalingChannel};
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingChannel that captures all outgoing messages.
#[derive(Clone)]
pub struct MockSignalingChannel {
    /// Channel to forward captured messages.
    tx: mpsc::UnboundedSender<SignalMessage>,
    /// All captured messages (for verification).
    sent: Arc<Mutex<Vec<SignalMessage>>>,
    closed: Arc<AtomicBool>,
}

impl MockSignalingChannel {
    /// Create a new MockSignalingChannel and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        };
        (signaling, rx)
    }

    /// All messages emitted so far, in order.
    pub async fn sent(&self) -> Vec<SignalMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages emitted under a specific wire event name.
    pub async fn sent_named(&self, event: &str) -> Vec<SignalMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.event_name() == event)
            .cloned()
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalingChannel for MockSignalingChannel {
    async fn emit(&self, msg: SignalMessage) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        tracing::debug!("[MockSignaling] emit '{}'", msg.event_name());

        self.sent.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
        Ok(())
    }

    async fn close(&self) {
        tracing::debug!("[MockSignaling] close");
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::RoomId;

    #[tokio::test]
    async fn test_mock_signaling_captures_messages() {
        let (signaling, mut rx) = MockSignalingChannel::new();
        let msg = SignalMessage::JoinRoom {
            room_id: RoomId::new("R1"),
        };

        signaling.emit(msg.clone()).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), msg);
        assert_eq!(signaling.sent_named("join room").await, vec![msg]);
    }

    #[tokio::test]
    async fn test_mock_signaling_rejects_after_close() {
        let (signaling, _rx) = MockSignalingChannel::new();
        signaling.close().await;

        let err = signaling
            .emit(SignalMessage::NewUserJoined {})
            .await
            .unwrap_err();
        assert_eq!(err, ChannelError::Closed);
        assert!(signaling.sent().await.is_empty());
    }
}
