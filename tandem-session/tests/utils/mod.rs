pub mod mock_engine;
pub mod mock_signaling;

pub use mock_engine::*;
pub use mock_signaling::*;
pub use recording_listener::*;
pub use signal_helpers::*;
