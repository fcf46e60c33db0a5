use crate::error::ChannelError;
use crate::signaling::{ChannelEvent, SignalingChannel};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tandem_core::{FrameError, SignalMessage, decode_frame};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 256;

/// WebSocket client link to the signaling server. One JSON text frame per event.
#[derive(Clone)]
pub struct WsSignalingChannel {
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsSignalingChannel {
    /// Opens the socket and starts the pump tasks.
    ///
    /// The returned receiver yields `Connected` first and `Disconnected` exactly
    /// once when either direction of the socket ends. There is no reconnect.
    pub async fn connect(
        address: &str,
    ) -> Result<(Self, mpsc::Receiver<ChannelEvent>), ChannelError> {
        let (socket, _) = connect_async(address)
            .await
            .map_err(|e| ChannelError::Connect {
                address: address.to_owned(),
                reason: e.to_string(),
            })?;
        info!("Signaling channel connected to {}", address);

        let (mut sink, mut stream) = socket.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        let _ = event_tx.send(ChannelEvent::Connected).await;

        let mut send_task = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        let mut recv_task = tokio::spawn({
            let event_tx = event_tx.clone();

            async move {
                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(Message::Text(text)) => {
                            let Some(event) = inbound_event(text.as_str()) else {
                                continue;
                            };
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            warn!("Signaling socket error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        tokio::spawn(async move {
            tokio::select! {
                _ = (&mut send_task) => recv_task.abort(),
                _ = (&mut recv_task) => send_task.abort(),
            };

            info!("Signaling channel disconnected");
            let _ = event_tx.send(ChannelEvent::Disconnected).await;
        });

        Ok((Self { outbound }, event_rx))
    }
}

fn inbound_event(text: &str) -> Option<ChannelEvent> {
    match decode_frame(text) {
        Ok(msg) => {
            debug!("Signal in: {}", msg.event_name());
            Some(ChannelEvent::Message(msg))
        }
        Err(FrameError::Malformed { event, reason }) => {
            Some(ChannelEvent::Malformed { event, reason })
        }
        Err(FrameError::UnknownEvent(event)) => {
            debug!("Ignoring unknown signaling event '{}'", event);
            None
        }
        Err(e) => {
            warn!("Dropping inbound frame: {}", e);
            None
        }
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingChannel {
    async fn emit(&self, msg: SignalMessage) -> Result<(), ChannelError> {
        let json = msg.encode().map_err(|e| ChannelError::Encode {
            event: msg.event_name(),
            reason: e.to_string(),
        })?;
        debug!("Signal out: {}", msg.event_name());

        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| ChannelError::Closed)
    }

    async fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}
