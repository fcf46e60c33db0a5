use anyhow::{Result, bail};
use tandem::session::{SessionError, SessionHandle};

/// One line typed by the user during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Mute,
    Unmute,
    VideoOff,
    VideoOn,
    SwitchCamera,
    Pause,
    Resume,
    Hangup,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let lowered = line.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        let cmd = match words.as_slice() {
            [] => return Ok(None),
            ["mute" | "m"] => Self::Mute,
            ["unmute" | "u"] => Self::Unmute,
            ["video", "off"] => Self::VideoOff,
            ["video", "on"] => Self::VideoOn,
            ["switch" | "camera" | "flip"] => Self::SwitchCamera,
            ["pause"] => Self::Pause,
            ["resume"] => Self::Resume,
            ["hangup" | "h"] => Self::Hangup,
            ["help" | "?"] => Self::Help,
            ["quit" | "exit" | "q"] => Self::Quit,
            _ => bail!("Unknown command '{}', type 'help'", line.trim()),
        };
        Ok(Some(cmd))
    }

    pub async fn apply(self, handle: &SessionHandle) -> Result<(), SessionError> {
        match self {
            Self::Mute => handle.set_audio_enabled(false).await,
            Self::Unmute => handle.set_audio_enabled(true).await,
            Self::VideoOff => handle.set_video_enabled(false).await,
            Self::VideoOn => handle.set_video_enabled(true).await,
            Self::SwitchCamera => handle.switch_camera().await,
            Self::Pause => handle.pause().await,
            Self::Resume => handle.resume().await,
            Self::Hangup => handle.hangup().await,
            Self::Help | Self::Quit => Ok(()),
        }
    }
}

pub const HELP: &str = "\
  mute | unmute        toggle the microphone
  video off | video on toggle the camera track
  switch               flip between front and back camera
  pause | resume       stop or restart capture
  hangup               leave the call, stay in the room
  quit                 end the session";
