mod signaling_channel;
mod ws_channel;

pub use signaling_channel::*;
pub use ws_channel::*;
