mod engine_event;
mod local_media;
mod media_config;
mod media_engine;
mod webrtc_engine;

pub use engine_event::*;
pub use local_media::*;
pub use media_config::*;
pub use media_engine::*;
pub use webrtc_engine::*;
