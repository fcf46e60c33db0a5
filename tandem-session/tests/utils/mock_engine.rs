use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tandem_core::{IceCandidate, IceServerConfig, SessionDescription};
use tandem_session::{
    CameraFacing, EngineError, EngineEvent, Generation, LocalStream, LocalTrack, MediaEngine,
    MediaParams, PeerConnection, PeerEventSink, TrackKind,
};
use tokio::sync::Mutex;

/// Every engine operation the session performs, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreatePeer { generation: Generation },
    OpenLocalStream { facing: CameraFacing },
    SetCaptureActive { stream_id: String, active: bool },
    ReleaseLocalStream { stream_id: String },
    CreateOffer { generation: Generation },
    CreateAnswer { generation: Generation },
    SetLocalDescription { generation: Generation, desc: SessionDescription },
    SetRemoteDescription { generation: Generation, desc: SessionDescription },
    AddIceCandidate { generation: Generation, candidate: IceCandidate },
    AddLocalStream { generation: Generation, stream_id: String },
    SetTrackEnabled { generation: Generation, kind: TrackKind, enabled: bool },
    Close { generation: Generation },
}

#[derive(Default)]
struct EngineState {
    calls: Mutex<Vec<EngineCall>>,
    sinks: Mutex<Vec<PeerEventSink>>,
    failing: Mutex<HashSet<&'static str>>,
    hanging: Mutex<HashSet<&'static str>>,
    streams: Mutex<u64>,
}

impl EngineState {
    async fn record(&self, op: &'static str, call: EngineCall) -> Result<(), EngineError> {
        tracing::debug!("[MockEngine] {:?}", call);
        self.calls.lock().await.push(call);

        if self.failing.lock().await.contains(op) {
            return Err(EngineError::operation(op, "injected failure"));
        }

        let hangs = self.hanging.lock().await.contains(op);
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// MediaEngine double. Records calls, keeps every sink it is handed so tests
/// can raise engine events for any generation, and fails or hangs on request.
#[derive(Clone, Default)]
pub struct MockMediaEngine {
    state: Arc<EngineState>,
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `op` fail.
    pub async fn fail_on(&self, op: &'static str) {
        self.state.failing.lock().await.insert(op);
    }

    /// Makes every later call of `op` record itself and then never complete.
    pub async fn hang_on(&self, op: &'static str) {
        self.state.hanging.lock().await.insert(op);
    }

    pub async fn calls(&self) -> Vec<EngineCall> {
        self.state.calls.lock().await.clone()
    }

    pub async fn count_calls<F>(&self, pred: F) -> usize
    where
        F: Fn(&EngineCall) -> bool,
    {
        self.state
            .calls
            .lock()
            .await
            .iter()
            .filter(|c| pred(*c))
            .count()
    }

    /// Wait until a call matching `pred` has been recorded.
    pub async fn wait_for_call<F>(&self, pred: F, timeout_ms: u64) -> bool
    where
        F: Fn(&EngineCall) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.state.calls.lock().await.iter().any(&pred) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn latest_generation(&self) -> Option<Generation> {
        self.state.sinks.lock().await.last().map(|s| s.generation())
    }

    /// Raises `event` as if the peer of `generation` produced it.
    pub async fn emit(&self, generation: Generation, event: EngineEvent) {
        let sink = self
            .state
            .sinks
            .lock()
            .await
            .iter()
            .find(|s| s.generation() == generation)
            .cloned()
            .expect("no peer with this generation");

        assert!(sink.send(event).await, "session is gone");
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn create_peer(
        &self,
        _ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerConnection>, EngineError> {
        let generation = events.generation();
        self.state
            .record("create_peer", EngineCall::CreatePeer { generation })
            .await?;
        self.state.sinks.lock().await.push(events);

        Ok(Box::new(MockPeer {
            generation,
            state: Arc::clone(&self.state),
        }))
    }

    async fn open_local_stream(
        &self,
        facing: CameraFacing,
        params: &MediaParams,
    ) -> Result<LocalStream, EngineError> {
        self.state
            .record("open_local_stream", EngineCall::OpenLocalStream { facing })
            .await?;

        let mut streams = self.state.streams.lock().await;
        *streams += 1;
        let stream_id = format!("mock-{}", *streams);

        let mut tracks = vec![LocalTrack::new(
            TrackKind::Audio,
            &stream_id,
            &params.audio_codec,
        )];
        if params.video_enabled {
            tracks.push(LocalTrack::new(
                TrackKind::Video,
                &stream_id,
                &params.video_codec,
            ));
        }
        Ok(LocalStream::new(stream_id, facing, tracks))
    }

    async fn set_capture_active(
        &self,
        stream: &LocalStream,
        active: bool,
    ) -> Result<(), EngineError> {
        self.state
            .record(
                "set_capture_active",
                EngineCall::SetCaptureActive {
                    stream_id: stream.id().to_owned(),
                    active,
                },
            )
            .await
    }

    async fn release_local_stream(&self, stream: LocalStream) -> Result<(), EngineError> {
        self.state
            .record(
                "release_local_stream",
                EngineCall::ReleaseLocalStream {
                    stream_id: stream.id().to_owned(),
                },
            )
            .await
    }
}

struct MockPeer {
    generation: Generation,
    state: Arc<EngineState>,
}

#[async_trait]
impl PeerConnection for MockPeer {
    async fn create_offer(&self) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record("create_offer", EngineCall::CreateOffer { generation })
            .await
    }

    async fn create_answer(&self) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record("create_answer", EngineCall::CreateAnswer { generation })
            .await
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record(
                "set_local_description",
                EngineCall::SetLocalDescription { generation, desc },
            )
            .await
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record(
                "set_remote_description",
                EngineCall::SetRemoteDescription { generation, desc },
            )
            .await
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record(
                "add_ice_candidate",
                EngineCall::AddIceCandidate {
                    generation,
                    candidate,
                },
            )
            .await
    }

    async fn add_local_stream(&self, stream: &LocalStream) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record(
                "add_local_stream",
                EngineCall::AddLocalStream {
                    generation,
                    stream_id: stream.id().to_owned(),
                },
            )
            .await
    }

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record(
                "set_track_enabled",
                EngineCall::SetTrackEnabled {
                    generation,
                    kind,
                    enabled,
                },
            )
            .await
    }

    async fn close(&self) -> Result<(), EngineError> {
        let generation = self.generation;
        self.state
            .record("close", EngineCall::Close { generation })
            .await
    }
}
