mod session_command;
mod session_config;
mod session_handle;
mod session_listener;
mod session_manager;
mod session_peer;

pub use session_command::*;
pub use session_config::*;
pub use session_handle::*;
pub use session_listener::*;
pub use session_manager::*;
pub use session_peer::{ConnectionStatus, NegotiationRole};

pub(crate) use session_peer::SessionPeer;
