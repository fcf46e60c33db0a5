use crate::engine::RemoteStream;
use tandem_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// Monotonic id of a session peer. Events carry it so that callbacks from a
/// torn-down connection never touch its replacement.
pub type Generation = u64;

/// Connectivity as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineConnectionState {
    New,
    Checking,
    Connected,
    /// Lost, failed or closed.
    Disconnected,
}

/// Callbacks the media engine raises for one peer connection.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A description requested through `create_offer`/`create_answer` is ready.
    DescriptionReady(SessionDescription),

    CandidateDiscovered(IceCandidate),

    ConnectionStateChanged(EngineConnectionState),

    RemoteStreamAdded(RemoteStream),

    /// The remote stream with this id went away.
    RemoteStreamRemoved(String),
}

/// Where a peer connection reports its [`EngineEvent`]s. Stamped with the
/// generation of the peer it was created for.
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    generation: Generation,
    tx: mpsc::Sender<(Generation, EngineEvent)>,
}

impl PeerEventSink {
    pub(crate) fn new(generation: Generation, tx: mpsc::Sender<(Generation, EngineEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns `false` once the session is gone.
    pub async fn send(&self, event: EngineEvent) -> bool {
        self.tx.send((self.generation, event)).await.is_ok()
    }
}
