use crate::error::EngineError;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    pub(crate) fn from_codec_type(kind: RTPCodecType) -> Option<Self> {
        match kind {
            RTPCodecType::Audio => Some(Self::Audio),
            RTPCodecType::Video => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraFacing {
    #[default]
    Front,
    Back,
}

impl CameraFacing {
    pub fn flipped(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

/// One local track. Capture code pushes encoded frames into it with
/// [`LocalTrack::write_sample`]; the peer connection packetizes them.
#[derive(Clone)]
pub struct LocalTrack {
    kind: TrackKind,
    track: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, stream_id: &str, mime_type: &str) -> Self {
        let track = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            format!("{}-{}", stream_id, kind),
            stream_id.to_owned(),
        );

        Self {
            kind,
            track: Arc::new(track),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.track)
    }

    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<(), EngineError> {
        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.track
            .write_sample(&sample)
            .await
            .map_err(|e| EngineError::operation("write_sample", e))
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Local capture: audio always, video when enabled. Recreated, never mutated,
/// when the camera changes.
#[derive(Debug, Clone)]
pub struct LocalStream {
    id: String,
    facing: CameraFacing,
    tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, facing: CameraFacing, tracks: Vec<LocalTrack>) -> Self {
        Self {
            id: id.into(),
            facing,
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind == kind)
    }

    pub fn has_video(&self) -> bool {
        self.track(TrackKind::Video).is_some()
    }
}

/// A track received from the other participant.
#[derive(Clone)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
    track: Option<Arc<TrackRemote>>,
}

impl RemoteStream {
    pub fn new(stream_id: impl Into<String>, track_id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            stream_id: stream_id.into(),
            track_id: track_id.into(),
            kind,
            track: None,
        }
    }

    pub(crate) fn from_rtc_track(track: Arc<TrackRemote>) -> Option<Self> {
        let kind = TrackKind::from_codec_type(track.kind())?;
        Some(Self {
            stream_id: track.stream_id(),
            track_id: track.id(),
            kind,
            track: Some(track),
        })
    }

    /// RTP source for renderers. `None` for streams not backed by a live connection.
    pub fn rtc_track(&self) -> Option<Arc<TrackRemote>> {
        self.track.clone()
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("stream_id", &self.stream_id)
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
