/// Requests from the UI side to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    SetAudioEnabled(bool),
    SetVideoEnabled(bool),

    /// Release the current camera and reopen with the opposite facing.
    SwitchCamera,

    /// Stop video capture without releasing the device.
    Pause,
    Resume,

    /// Close the active peer but stay in the room.
    Hangup,

    Shutdown,
}
