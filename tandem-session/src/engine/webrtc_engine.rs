use crate::engine::{
    CameraFacing, EngineConnectionState, EngineEvent, LocalStream, LocalTrack, MediaEngine,
    MediaParams, PeerConnection, PeerEventSink, RemoteStream, TrackKind,
};
use crate::error::EngineError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tandem_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine as RtcMediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// A camera opened for one local stream.
pub trait CaptureDevice: Send + Sync {
    /// Begins pushing encoded frames into `track`.
    fn start(&self, track: LocalTrack) -> Result<(), EngineError>;

    fn stop(&self);

    /// Frees the hardware handle. The device is never used again afterwards.
    fn release(&self);
}

/// Opens cameras by facing.
pub trait CaptureProvider: Send + Sync {
    fn open(
        &self,
        facing: CameraFacing,
        params: &MediaParams,
    ) -> Result<Box<dyn CaptureDevice>, EngineError>;
}

/// [`MediaEngine`] backed by the `webrtc` crate.
///
/// Without a [`CaptureProvider`] the local tracks are still negotiated but
/// stay silent until something writes samples into them.
///
/// Peers built here never raise `EngineEvent::RemoteStreamRemoved`; the
/// session reports remote removal when the connection goes `Disconnected`.
#[derive(Default)]
pub struct WebRtcEngine {
    capture: Option<Arc<dyn CaptureProvider>>,
    devices: DashMap<String, Box<dyn CaptureDevice>>,
    next_stream: AtomicU64,
}

impl WebRtcEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capture(capture: Arc<dyn CaptureProvider>) -> Self {
        Self {
            capture: Some(capture),
            ..Self::default()
        }
    }
}

#[async_trait]
impl MediaEngine for WebRtcEngine {
    async fn create_peer(
        &self,
        ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerConnection>, EngineError> {
        let peer_connection = Arc::new(
            build_peer_connection(ice_servers)
                .await
                .map_err(|e| EngineError::operation("create_peer", format!("{:#}", e)))?,
        );

        // Every callback gets its own clone of the sink; they must be 'static.
        let state_events = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!(
                        "ICE connection state for peer #{}: {}",
                        events.generation(),
                        s
                    );
                    let Some(state) = connection_state(s) else {
                        return;
                    };
                    let _ = events
                        .send(EngineEvent::ConnectionStateChanged(state))
                        .await;
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate::new(
                    init.sdp_mid.unwrap_or_default(),
                    init.sdp_mline_index.unwrap_or_default(),
                    init.candidate,
                );
                let _ = events.send(EngineEvent::CandidateDiscovered(candidate)).await;
            })
        }));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    let Some(stream) = RemoteStream::from_rtc_track(track) else {
                        return;
                    };
                    debug!(
                        "Remote {} track '{}' on peer #{}",
                        stream.kind,
                        stream.track_id,
                        events.generation()
                    );
                    let _ = events.send(EngineEvent::RemoteStreamAdded(stream)).await;
                })
            },
        ));

        Ok(Box::new(WebRtcPeer {
            peer_connection,
            events,
            attached: Mutex::new(Vec::new()),
            video_receiver: AtomicBool::new(false),
        }))
    }

    async fn open_local_stream(
        &self,
        facing: CameraFacing,
        params: &MediaParams,
    ) -> Result<LocalStream, EngineError> {
        let stream_id = format!("local-{}", self.next_stream.fetch_add(1, Ordering::Relaxed));
        let mut tracks = vec![LocalTrack::new(
            TrackKind::Audio,
            &stream_id,
            &params.audio_codec,
        )];

        if params.video_enabled {
            let video = LocalTrack::new(TrackKind::Video, &stream_id, &params.video_codec);

            if let Some(capture) = &self.capture {
                let device = capture.open(facing, params)?;
                if let Err(e) = device.start(video.clone()) {
                    device.release();
                    return Err(e);
                }
                self.devices.insert(stream_id.clone(), device);
            }
            tracks.push(video);
        }

        info!(
            "Opened local stream {} ({:?} camera, {} track(s))",
            stream_id,
            facing,
            tracks.len()
        );
        Ok(LocalStream::new(stream_id, facing, tracks))
    }

    async fn set_capture_active(
        &self,
        stream: &LocalStream,
        active: bool,
    ) -> Result<(), EngineError> {
        let Some(device) = self.devices.get(stream.id()) else {
            return Ok(());
        };

        if !active {
            device.stop();
            return Ok(());
        }

        match stream.track(TrackKind::Video) {
            Some(video) => device.start(video.clone()),
            None => Ok(()),
        }
    }

    async fn release_local_stream(&self, stream: LocalStream) -> Result<(), EngineError> {
        if let Some((_, device)) = self.devices.remove(stream.id()) {
            device.stop();
            device.release();
        }
        info!("Released local stream {}", stream.id());
        Ok(())
    }
}

async fn build_peer_connection(ice_servers: &[IceServerConfig]) -> Result<RTCPeerConnection> {
    // Codecs are registered even for audio-only calls so the remote video can be received.
    let mut media_engine = RtcMediaEngine::default();
    media_engine.register_default_codecs()?;
    let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let rtc_config = RTCConfiguration {
        ice_servers: ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    api.new_peer_connection(rtc_config)
        .await
        .context("Failed to create peer connection")
}

fn connection_state(state: RTCIceConnectionState) -> Option<EngineConnectionState> {
    match state {
        RTCIceConnectionState::New => Some(EngineConnectionState::New),
        RTCIceConnectionState::Checking => Some(EngineConnectionState::Checking),
        RTCIceConnectionState::Connected | RTCIceConnectionState::Completed => {
            Some(EngineConnectionState::Connected)
        }
        RTCIceConnectionState::Failed
        | RTCIceConnectionState::Disconnected
        | RTCIceConnectionState::Closed => Some(EngineConnectionState::Disconnected),
        _ => None,
    }
}

fn rtc_description(desc: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = desc.sdp().to_owned();
    let rtc = match desc.sdp_type() {
        SdpType::Offer => RTCSessionDescription::offer(sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(sdp)?,
    };
    Ok(rtc)
}

struct AttachedTrack {
    kind: TrackKind,
    sender: Arc<RTCRtpSender>,
    track: Arc<TrackLocalStaticSample>,
}

struct WebRtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
    events: PeerEventSink,
    attached: Mutex<Vec<AttachedTrack>>,
    video_receiver: AtomicBool,
}

impl WebRtcPeer {
    /// Hands a created description back through the event sink. Spawned so a
    /// full event queue cannot stall the caller.
    fn deliver(&self, desc: SessionDescription) {
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events.send(EngineEvent::DescriptionReady(desc)).await;
        });
    }
}

#[async_trait]
impl PeerConnection for WebRtcPeer {
    async fn create_offer(&self) -> Result<(), EngineError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| EngineError::operation("create_offer", e))?;
        self.deliver(SessionDescription::offer(offer.sdp));
        Ok(())
    }

    async fn create_answer(&self) -> Result<(), EngineError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| EngineError::operation("create_answer", e))?;
        self.deliver(SessionDescription::answer(answer.sdp));
        Ok(())
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let rtc = rtc_description(&desc)
            .map_err(|e| EngineError::operation("set_local_description", e))?;
        self.peer_connection
            .set_local_description(rtc)
            .await
            .map_err(|e| EngineError::operation("set_local_description", e))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let rtc = rtc_description(&desc)
            .map_err(|e| EngineError::operation("set_remote_description", e))?;
        self.peer_connection
            .set_remote_description(rtc)
            .await
            .map_err(|e| EngineError::operation("set_remote_description", e))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: Some(candidate.sdp_mid),
            sdp_mline_index: Some(candidate.sdp_m_line_index),
            ..Default::default()
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| EngineError::operation("add_ice_candidate", e))
    }

    async fn add_local_stream(&self, stream: &LocalStream) -> Result<(), EngineError> {
        let mut attached = self.attached.lock().await;

        for local in stream.tracks() {
            let track = local.rtc_track();
            let as_local = Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>;

            if let Some(slot) = attached.iter_mut().find(|a| a.kind == local.kind()) {
                slot.sender
                    .replace_track(Some(as_local))
                    .await
                    .map_err(|e| EngineError::operation("add_local_stream", e))?;
                slot.track = track;
                continue;
            }

            let sender = self
                .peer_connection
                .add_track(as_local)
                .await
                .map_err(|e| EngineError::operation("add_local_stream", e))?;

            // RTCP has to be read for the interceptors to run.
            let rtcp_sender = Arc::clone(&sender);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while rtcp_sender.read(&mut buf).await.is_ok() {}
            });

            attached.push(AttachedTrack {
                kind: local.kind(),
                sender,
                track,
            });
        }

        let sends_video = attached.iter().any(|a| a.kind == TrackKind::Video);
        if !sends_video && !self.video_receiver.swap(true, Ordering::SeqCst) {
            self.peer_connection
                .add_transceiver_from_kind(
                    RTPCodecType::Video,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await
                .map_err(|e| EngineError::operation("add_local_stream", e))?;
        }

        Ok(())
    }

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<(), EngineError> {
        let attached = self.attached.lock().await;
        let Some(slot) = attached.iter().find(|a| a.kind == kind) else {
            warn!("No local {} track attached to peer #{}", kind, self.events.generation());
            return Ok(());
        };

        let track =
            enabled.then(|| Arc::clone(&slot.track) as Arc<dyn TrackLocal + Send + Sync>);
        slot.sender
            .replace_track(track)
            .await
            .map_err(|e| EngineError::operation("set_track_enabled", e))
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.peer_connection
            .close()
            .await
            .map_err(|e| EngineError::operation("close", e))
    }
}
