use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)]
}
