use crate::model::candidate::IceCandidate;
use crate::model::description::{SdpType, SessionDescription};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// One signaling frame: `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    #[serde(rename = "join room")]
    JoinRoom { room_id: RoomId },

    #[serde(rename = "new user joined")]
    NewUserJoined {},

    #[serde(rename = "offer")]
    Offer {
        room_id: RoomId,
        offer: SessionDescription,
    },

    #[serde(rename = "answer")]
    Answer {
        room_id: RoomId,
        answer: SessionDescription,
    },

    #[serde(rename = "new ice candidate")]
    NewIceCandidate {
        room_id: RoomId,
        ice_candidate: IceCandidate,
    },

    /// Free-form alert text pushed by the server.
    #[serde(rename = "message")]
    Chat { message: String },
}

pub const EVENT_NAMES: [&str; 6] = [
    "join room",
    "new user joined",
    "offer",
    "answer",
    "new ice candidate",
    "message",
];

impl SignalMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join room",
            Self::NewUserJoined {} => "new user joined",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::NewIceCandidate { .. } => "new ice candidate",
            Self::Chat { .. } => "message",
        }
    }

    /// Room the message is addressed to, if the variant names one.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::JoinRoom { room_id }
            | Self::Offer { room_id, .. }
            | Self::Answer { room_id, .. }
            | Self::NewIceCandidate { room_id, .. } => Some(room_id),
            Self::NewUserJoined {} | Self::Chat { .. } => None,
        }
    }

    /// Wraps a local description in the event matching its type.
    pub fn description(room_id: RoomId, desc: SessionDescription) -> Self {
        match desc.sdp_type() {
            SdpType::Offer => Self::Offer {
                room_id,
                offer: desc,
            },
            SdpType::Answer => Self::Answer {
                room_id,
                answer: desc,
            },
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame is not a signaling envelope: {0}")]
    Invalid(String),

    #[error("unknown signaling event '{0}'")]
    UnknownEvent(String),

    #[error("malformed '{event}' payload: {reason}")]
    Malformed { event: String, reason: String },
}

/// Decodes one inbound text frame.
///
/// Payload-less events (`"new user joined"` is usually sent bare) are accepted
/// without a `data` member or with `"data": null`.
pub fn decode_frame(text: &str) -> Result<SignalMessage, FrameError> {
    let mut frame: Map<String, Value> =
        serde_json::from_str(text).map_err(|e| FrameError::Invalid(e.to_string()))?;

    let event = match frame.get("event") {
        Some(Value::String(name)) => name.clone(),
        _ => return Err(FrameError::Invalid("missing string 'event'".to_owned())),
    };

    if !EVENT_NAMES.contains(&event.as_str()) {
        return Err(FrameError::UnknownEvent(event));
    }

    let data = frame.entry("data").or_insert(Value::Null);
    if data.is_null() {
        *data = Value::Object(Map::new());
    }

    serde_json::from_value(Value::Object(frame)).map_err(|e| FrameError::Malformed {
        event,
        reason: e.to_string(),
    })
}
