use crate::engine::MediaParams;
use std::time::Duration;
use tandem_core::utils::default_ice_servers;
use tandem_core::{IceServerConfig, RoomId};

pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a session needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room_id: RoomId,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaParams,
    /// Upper bound for every engine call and for each pending offer/answer.
    pub negotiation_timeout: Duration,
}

impl SessionConfig {
    pub fn new(room_id: impl Into<RoomId>) -> Self {
        Self {
            room_id: room_id.into(),
            ice_servers: default_ice_servers(),
            media: MediaParams::default(),
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}
