//! Two-party call negotiation: a signaling channel, a media-engine seam and
//! the session actor that drives one peer connection through offer, answer
//! and ICE exchange.

pub mod engine;
pub mod error;
pub mod session;
pub mod signaling;

pub use engine::*;
pub use error::*;
pub use session::*;
pub use signaling::*;
