use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};

/// Capture and codec parameters for the local stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaParams {
    /// Audio is always captured; video only when this is set.
    pub video_enabled: bool,
    pub video_width: u32,
    pub video_height: u32,
    pub video_fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for MediaParams {
    fn default() -> Self {
        Self {
            video_enabled: true,
            video_width: 1280,
            video_height: 720,
            video_fps: 30,
            video_codec: MIME_TYPE_VP8.to_owned(),
            audio_codec: MIME_TYPE_OPUS.to_owned(),
        }
    }
}

impl MediaParams {
    pub fn audio_only() -> Self {
        Self {
            video_enabled: false,
            ..Self::default()
        }
    }
}
