mod candidate;
mod description;
mod room;
mod signaling;

pub use candidate::IceCandidate;
pub use description::{SdpType, SessionDescription};
pub use room::RoomId;
pub use signaling::{EVENT_NAMES, FrameError, IceServerConfig, SignalMessage, decode_frame};
