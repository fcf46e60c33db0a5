pub use tandem_core::model::RoomId;

pub mod model {
    pub use tandem_core::model::*;
    pub use tandem_core::utils::default_ice_servers;
}

#[cfg(feature = "session")]
pub mod session {
    pub use tandem_session::*;
}
