//! Wire model shared by the session engine and its front-ends: rooms,
//! signaling frames, session descriptions and ICE candidates.

pub mod model;
pub mod utils;

pub use model::*;
