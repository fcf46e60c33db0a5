use crate::engine::MediaEngine;
use crate::error::SessionError;
use crate::session::{SessionCommand, SessionConfig, SessionListener, SessionManager};
use crate::signaling::{ChannelEvent, SignalingChannel};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Cheap, cloneable front door to a running [`SessionManager`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(commands: mpsc::Sender<SessionCommand>) -> Self {
        Self { commands }
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetAudioEnabled(enabled)).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetVideoEnabled(enabled)).await
    }

    pub async fn switch_camera(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::SwitchCamera).await
    }

    pub async fn pause(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn hangup(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Hangup).await
    }

    /// Tears the session down: peer closed, local media released, channel closed.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    pub async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| SessionError::Stopped)
    }
}

/// Builds a [`SessionManager`] and runs it on its own task.
pub fn spawn_session(
    config: SessionConfig,
    engine: Arc<dyn MediaEngine>,
    signaling: Arc<dyn SignalingChannel>,
    channel_rx: mpsc::Receiver<ChannelEvent>,
    listener: Box<dyn SessionListener>,
) -> (SessionHandle, JoinHandle<()>) {
    info!("Spawning session for room {}", config.room_id);

    let (tx, rx) = mpsc::channel(100);
    let manager = SessionManager::new(config, engine, signaling, channel_rx, listener, rx);
    let task = tokio::spawn(manager.run());

    (SessionHandle::new(tx), task)
}
