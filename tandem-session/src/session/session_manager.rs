use crate::engine::{
    CameraFacing, EngineEvent, Generation, LocalStream, MediaEngine, PeerEventSink, TrackKind,
};
use crate::error::{EngineError, SessionError};
use crate::session::{
    ConnectionStatus, NegotiationRole, SessionCommand, SessionConfig, SessionListener, SessionPeer,
};
use crate::signaling::{ChannelEvent, SignalingChannel};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::{IceCandidate, SdpType, SessionDescription, SignalMessage};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Owns the negotiation state machine for one room.
///
/// Inbound signaling, engine callbacks and UI commands all arrive on channels
/// and are handled one at a time by [`SessionManager::run`].
pub struct SessionManager {
    config: SessionConfig,
    engine: Arc<dyn MediaEngine>,
    signaling: Arc<dyn SignalingChannel>,
    listener: Box<dyn SessionListener>,
    channel_rx: mpsc::Receiver<ChannelEvent>,
    channel_open: bool,
    command_rx: mpsc::Receiver<SessionCommand>,
    engine_rx: mpsc::Receiver<(Generation, EngineEvent)>,
    engine_tx: mpsc::Sender<(Generation, EngineEvent)>,
    peer: Option<SessionPeer>,
    next_generation: Generation,
    local_stream: Option<LocalStream>,
    facing: CameraFacing,
    audio_enabled: bool,
    video_enabled: bool,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        engine: Arc<dyn MediaEngine>,
        signaling: Arc<dyn SignalingChannel>,
        channel_rx: mpsc::Receiver<ChannelEvent>,
        listener: Box<dyn SessionListener>,
        command_rx: mpsc::Receiver<SessionCommand>,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::channel(256);

        Self {
            config,
            engine,
            signaling,
            listener,
            channel_rx,
            channel_open: true,
            command_rx,
            engine_rx,
            engine_tx,
            peer: None,
            next_generation: 0,
            local_stream: None,
            facing: CameraFacing::default(),
            audio_enabled: true,
            video_enabled: true,
        }
    }

    pub async fn run(mut self) {
        info!("Session for room {} started", self.config.room_id);

        // Local media exists before the first peer so it can be attached right away.
        self.open_local_stream().await;

        loop {
            let deadline = self.peer.as_ref().and_then(|p| p.description_deadline);

            tokio::select! {
                event = self.channel_rx.recv(), if self.channel_open => {
                    match event {
                        Some(e) => self.handle_channel_event(e).await,
                        None => {
                            debug!("Signaling event stream ended");
                            self.channel_open = false;
                        }
                    }
                }

                Some((generation, event)) = self.engine_rx.recv() => {
                    self.handle_engine_event(generation, event).await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down session.");
                            break;
                        }
                    }
                }

                _ = wait_until(deadline) => self.handle_description_timeout().await,
            }
        }

        self.teardown().await;
        info!("Session for room {} finished", self.config.room_id);
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => {
                info!("Signaling connected, joining room {}", self.config.room_id);
                self.emit(SignalMessage::JoinRoom {
                    room_id: self.config.room_id.clone(),
                })
                .await;
            }

            ChannelEvent::Message(msg) => self.handle_signal(msg).await,

            ChannelEvent::Malformed { event, reason } => {
                warn!("Dropping malformed '{}' message: {}", event, reason);
                self.listener
                    .on_error(SessionError::Malformed { event, reason })
                    .await;
            }

            ChannelEvent::Disconnected => info!("Signaling channel disconnected"),
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        if let Some(room_id) = msg.room_id()
            && room_id != &self.config.room_id
        {
            warn!(
                "Dropping '{}' for room {} (joined {})",
                msg.event_name(),
                room_id,
                self.config.room_id
            );
            return;
        }

        match msg {
            SignalMessage::JoinRoom { .. } => debug!("Ignoring inbound 'join room'"),

            SignalMessage::NewUserJoined {} => self.start_offer().await,

            SignalMessage::Offer { offer, .. } => self.accept_offer(offer).await,

            SignalMessage::Answer { answer, .. } => self.apply_answer(answer).await,

            SignalMessage::NewIceCandidate { ice_candidate, .. } => {
                self.apply_remote_candidate(ice_candidate).await
            }

            SignalMessage::Chat { message } => self.listener.on_message(message).await,
        }
    }

    async fn start_offer(&mut self) {
        info!("Remote user joined room {}", self.config.room_id);

        if !self.open_peer(NegotiationRole::Offerer).await {
            return;
        }

        let limit = self.config.negotiation_timeout;
        let Some(peer) = self.peer.as_mut() else {
            return;
        };

        let requested = with_timeout(limit, "create_offer", peer.connection.create_offer()).await;
        match requested {
            Ok(()) => peer.description_deadline = Some(Instant::now() + limit),
            Err(e) => {
                error!("Failed to create offer for peer #{}: {}", peer.generation, e);
                self.listener
                    .on_error(SessionError::Negotiation(e))
                    .await;
            }
        }
    }

    async fn accept_offer(&mut self, offer: SessionDescription) {
        if offer.sdp_type() != SdpType::Offer {
            self.reject_description("offer", &offer).await;
            return;
        }

        info!("Received offer for room {}", self.config.room_id);

        if !self.open_peer(NegotiationRole::Answerer).await {
            return;
        }

        let limit = self.config.negotiation_timeout;
        let Some(peer) = self.peer.as_mut() else {
            return;
        };

        let applied = with_timeout(
            limit,
            "set_remote_description",
            peer.connection.set_remote_description(offer),
        )
        .await;
        if let Err(e) = applied {
            error!("Failed to apply offer on peer #{}: {}", peer.generation, e);
            self.listener.on_error(SessionError::Negotiation(e)).await;
            return;
        }
        peer.remote_description_set = true;

        let requested =
            with_timeout(limit, "create_answer", peer.connection.create_answer()).await;
        match requested {
            Ok(()) => peer.description_deadline = Some(Instant::now() + limit),
            Err(e) => {
                error!("Failed to create answer for peer #{}: {}", peer.generation, e);
                self.listener.on_error(SessionError::Negotiation(e)).await;
            }
        }
    }

    async fn apply_answer(&mut self, answer: SessionDescription) {
        if answer.sdp_type() != SdpType::Answer {
            self.reject_description("answer", &answer).await;
            return;
        }

        let limit = self.config.negotiation_timeout;
        let Some(peer) = self.peer.as_mut() else {
            debug!("Dropping answer, no active peer");
            return;
        };
        if peer.role != NegotiationRole::Offerer {
            warn!("Dropping answer, peer #{} is the answerer", peer.generation);
            return;
        }
        if peer.remote_description_set {
            info!("Ignoring repeated answer for peer #{}", peer.generation);
            return;
        }

        let applied = with_timeout(
            limit,
            "set_remote_description",
            peer.connection.set_remote_description(answer),
        )
        .await;
        match applied {
            Ok(()) => {
                debug!("Answer applied on peer #{}", peer.generation);
                peer.remote_description_set = true;
            }
            Err(e) => {
                error!("Failed to apply answer on peer #{}: {}", peer.generation, e);
                self.listener.on_error(SessionError::Negotiation(e)).await;
            }
        }
    }

    async fn apply_remote_candidate(&mut self, candidate: IceCandidate) {
        let Some(peer) = self.peer.as_ref() else {
            debug!("Dropping ICE candidate, no active peer");
            return;
        };
        // No buffering: early candidates are lost.
        if !peer.remote_description_set {
            debug!(
                "Dropping ICE candidate for peer #{}, remote description not set",
                peer.generation
            );
            return;
        }

        let applied = with_timeout(
            self.config.negotiation_timeout,
            "add_ice_candidate",
            peer.connection.add_ice_candidate(candidate),
        )
        .await;
        if let Err(e) = applied {
            warn!("Failed to add ICE candidate on peer #{}: {}", peer.generation, e);
        }
    }

    async fn reject_description(&self, event: &str, desc: &SessionDescription) {
        let reason = format!("carries a description of type '{}'", desc.sdp_type());
        warn!("Dropping '{}' message: {}", event, reason);
        self.listener
            .on_error(SessionError::Malformed {
                event: event.to_owned(),
                reason,
            })
            .await;
    }

    /// Replaces any existing peer with a fresh one and attaches local media.
    /// Returns `false` if the engine could not build the connection.
    async fn open_peer(&mut self, role: NegotiationRole) -> bool {
        self.close_peer().await;

        self.next_generation += 1;
        let generation = self.next_generation;
        let sink = PeerEventSink::new(generation, self.engine_tx.clone());

        let created = with_timeout(
            self.config.negotiation_timeout,
            "create_peer",
            self.engine.create_peer(&self.config.ice_servers, sink),
        )
        .await;
        let connection = match created {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to create peer #{}: {}", generation, e);
                self.listener.on_error(SessionError::Negotiation(e)).await;
                return false;
            }
        };

        info!("Created {} peer #{}", role, generation);
        self.peer = Some(SessionPeer::new(generation, role, connection));
        self.listener
            .on_status_changed(ConnectionStatus::Connecting)
            .await;

        self.attach_local_stream().await;
        true
    }

    /// Closes the active peer, if any, and hands it back for bookkeeping.
    async fn close_peer(&mut self) -> Option<SessionPeer> {
        let peer = self.peer.take()?;
        debug!("Closing peer #{}", peer.generation);

        let closed = with_timeout(
            self.config.negotiation_timeout,
            "close",
            peer.connection.close(),
        )
        .await;
        if let Err(e) = closed {
            warn!("Failed to close peer #{}: {}", peer.generation, e);
        }
        Some(peer)
    }

    /// Attaches the local stream to the active peer and reapplies muted tracks.
    async fn attach_local_stream(&self) {
        let (Some(peer), Some(stream)) = (self.peer.as_ref(), self.local_stream.as_ref()) else {
            return;
        };
        let limit = self.config.negotiation_timeout;

        let mut result = with_timeout(
            limit,
            "add_local_stream",
            peer.connection.add_local_stream(stream),
        )
        .await;

        for (kind, enabled) in [
            (TrackKind::Audio, self.audio_enabled),
            (TrackKind::Video, self.video_enabled),
        ] {
            if result.is_err() || enabled {
                continue;
            }
            result = with_timeout(
                limit,
                "set_track_enabled",
                peer.connection.set_track_enabled(kind, false),
            )
            .await;
        }

        if let Err(e) = result {
            warn!("Failed to attach local media to peer #{}: {}", peer.generation, e);
            self.listener.on_error(SessionError::Media(e)).await;
        }
    }

    async fn handle_engine_event(&mut self, generation: Generation, event: EngineEvent) {
        let Some(peer) = self.peer.as_mut().filter(|p| p.generation == generation) else {
            debug!("Dropping engine event from stale peer #{}", generation);
            return;
        };

        match event {
            EngineEvent::DescriptionReady(desc) => {
                peer.description_deadline = None;

                let applied = with_timeout(
                    self.config.negotiation_timeout,
                    "set_local_description",
                    peer.connection.set_local_description(desc.clone()),
                )
                .await;
                if let Err(e) = applied {
                    error!("Failed to set local {} on peer #{}: {}", desc.sdp_type(), generation, e);
                    self.listener.on_error(SessionError::Negotiation(e)).await;
                    return;
                }

                debug!("Sending local {} for peer #{}", desc.sdp_type(), generation);
                self.emit(SignalMessage::description(self.config.room_id.clone(), desc))
                    .await;
            }

            EngineEvent::CandidateDiscovered(candidate) => {
                self.emit(SignalMessage::NewIceCandidate {
                    room_id: self.config.room_id.clone(),
                    ice_candidate: candidate,
                })
                .await;
            }

            EngineEvent::ConnectionStateChanged(state) => {
                let Some(next) = peer.status.on_engine_signal(state) else {
                    debug!("Peer #{} stays {} on {:?}", generation, peer.status, state);
                    return;
                };
                peer.status = next;

                info!("Peer #{} is {}", generation, next);
                self.listener.on_status_changed(next).await;
                if next == ConnectionStatus::Disconnected {
                    self.announce_remote_removed().await;
                }
            }

            EngineEvent::RemoteStreamAdded(stream) => {
                info!("Remote {} stream {} added", stream.kind, stream.stream_id);
                self.listener.on_remote_stream_added(stream).await;
            }

            EngineEvent::RemoteStreamRemoved(stream_id) => {
                info!("Remote stream {} removed", stream_id);
                self.announce_remote_removed().await;
            }
        }
    }

    async fn announce_remote_removed(&mut self) {
        let Some(peer) = self.peer.as_mut() else {
            return;
        };
        if peer.removal_announced {
            return;
        }
        peer.removal_announced = true;
        self.listener.on_remote_stream_removed().await;
    }

    async fn handle_description_timeout(&mut self) {
        let Some(peer) = self.peer.as_mut() else {
            return;
        };
        peer.description_deadline = None;

        let op = peer.role.create_op();
        error!("Peer #{}: {} produced no description in time", peer.generation, op);
        self.listener
            .on_error(SessionError::Negotiation(EngineError::TimedOut { op }))
            .await;
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::SetAudioEnabled(enabled) => {
                self.audio_enabled = enabled;
                self.set_track_enabled(TrackKind::Audio, enabled).await;
            }

            SessionCommand::SetVideoEnabled(enabled) => {
                self.video_enabled = enabled;
                self.set_track_enabled(TrackKind::Video, enabled).await;
            }

            SessionCommand::SwitchCamera => self.switch_camera().await,

            SessionCommand::Pause => self.set_capture_active(false).await,

            SessionCommand::Resume => self.set_capture_active(true).await,

            SessionCommand::Hangup => self.hangup().await,

            // Handled by the run loop.
            SessionCommand::Shutdown => {}
        }
    }

    async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) {
        info!("Local {} {}", kind, if enabled { "enabled" } else { "disabled" });

        // Without a peer the flag is applied on the next attach.
        let Some(peer) = self.peer.as_ref() else {
            return;
        };

        let toggled = with_timeout(
            self.config.negotiation_timeout,
            "set_track_enabled",
            peer.connection.set_track_enabled(kind, enabled),
        )
        .await;
        if let Err(e) = toggled {
            warn!("Failed to toggle {} on peer #{}: {}", kind, peer.generation, e);
            self.listener.on_error(SessionError::Media(e)).await;
        }
    }

    async fn set_capture_active(&self, active: bool) {
        let Some(stream) = self.local_stream.as_ref() else {
            return;
        };
        info!("{} capture for {}", if active { "Resuming" } else { "Pausing" }, stream.id());

        let changed = with_timeout(
            self.config.negotiation_timeout,
            "set_capture_active",
            self.engine.set_capture_active(stream, active),
        )
        .await;
        if let Err(e) = changed {
            warn!("Failed to change capture state: {}", e);
            self.listener.on_error(SessionError::Media(e)).await;
        }
    }

    async fn switch_camera(&mut self) {
        let facing = self.facing.flipped();
        info!("Switching camera to {:?}", facing);

        self.release_local_stream().await;
        self.facing = facing;
        self.open_local_stream().await;
        self.attach_local_stream().await;
    }

    async fn hangup(&mut self) {
        let Some(peer) = self.close_peer().await else {
            debug!("Hangup with no active peer");
            return;
        };
        info!("Hung up peer #{}", peer.generation);

        if peer.status != ConnectionStatus::Disconnected {
            self.listener
                .on_status_changed(ConnectionStatus::Disconnected)
                .await;
        }
        if !peer.removal_announced {
            self.listener.on_remote_stream_removed().await;
        }
    }

    async fn open_local_stream(&mut self) {
        let opened = with_timeout(
            self.config.negotiation_timeout,
            "open_local_stream",
            self.engine.open_local_stream(self.facing, &self.config.media),
        )
        .await;

        match opened {
            Ok(stream) => {
                self.listener.on_local_stream(&stream).await;
                self.local_stream = Some(stream);
            }
            Err(e) => {
                error!("Failed to open local media: {}", e);
                self.listener.on_error(SessionError::Media(e)).await;
            }
        }
    }

    async fn release_local_stream(&mut self) {
        let Some(stream) = self.local_stream.take() else {
            return;
        };

        let released = with_timeout(
            self.config.negotiation_timeout,
            "release_local_stream",
            self.engine.release_local_stream(stream),
        )
        .await;
        if let Err(e) = released {
            warn!("Failed to release local media: {}", e);
            self.listener.on_error(SessionError::Media(e)).await;
        }
    }

    async fn teardown(&mut self) {
        self.close_peer().await;
        self.release_local_stream().await;
        self.signaling.close().await;
    }

    async fn emit(&self, msg: SignalMessage) {
        let event = msg.event_name();
        if let Err(e) = self.signaling.emit(msg).await {
            warn!("Failed to send '{}': {}", event, e);
        }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    op: &'static str,
    fut: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| EngineError::TimedOut { op })?
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
