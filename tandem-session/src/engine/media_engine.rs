use crate::engine::{CameraFacing, LocalStream, MediaParams, PeerEventSink, TrackKind};
use crate::error::EngineError;
use async_trait::async_trait;
use tandem_core::{IceCandidate, IceServerConfig, SessionDescription};

/// Capability set the session drives. Owns capture devices and builds peer
/// connections; everything it produces asynchronously comes back through the
/// [`PeerEventSink`] handed to [`MediaEngine::create_peer`].
#[async_trait]
pub trait MediaEngine: Send + Sync + 'static {
    async fn create_peer(
        &self,
        ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerConnection>, EngineError>;

    /// Acquires the capture device(s) and builds a fresh local stream.
    async fn open_local_stream(
        &self,
        facing: CameraFacing,
        params: &MediaParams,
    ) -> Result<LocalStream, EngineError>;

    /// Stops or restarts video capture without giving the device up.
    async fn set_capture_active(&self, stream: &LocalStream, active: bool)
    -> Result<(), EngineError>;

    /// Gives the capture device(s) behind `stream` back to the system.
    async fn release_local_stream(&self, stream: LocalStream) -> Result<(), EngineError>;
}

/// One underlying peer connection, exclusively owned by a session peer.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Starts offer creation; the result arrives as `EngineEvent::DescriptionReady`.
    async fn create_offer(&self) -> Result<(), EngineError>;

    /// Starts answer creation; the result arrives as `EngineEvent::DescriptionReady`.
    async fn create_answer(&self) -> Result<(), EngineError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError>;

    /// Attaches every track of `stream`, replacing tracks of the same kind
    /// that were attached before.
    async fn add_local_stream(&self, stream: &LocalStream) -> Result<(), EngineError>;

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<(), EngineError>;

    async fn close(&self) -> Result<(), EngineError>;
}
