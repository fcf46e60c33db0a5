use serde::{Deserialize, Serialize};

/// Trickle ICE candidate as it travels over the signaling channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    #[serde(rename = "sdpMid")]
    pub sdp_mid: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_m_line_index: u16,
    #[serde(rename = "sdpCandidate")]
    pub candidate: String,
}

impl IceCandidate {
    pub fn new(sdp_mid: impl Into<String>, sdp_m_line_index: u16, candidate: impl Into<String>) -> Self {
        Self {
            sdp_mid: sdp_mid.into(),
            sdp_m_line_index,
            candidate: candidate.into(),
        }
    }
}
