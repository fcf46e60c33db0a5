use crate::engine::{LocalStream, RemoteStream};
use crate::error::SessionError;
use crate::session::ConnectionStatus;
use async_trait::async_trait;

/// UI-side observer of a session. Every callback runs on the session task, so
/// implementations that touch a UI thread must hop over themselves.
#[async_trait]
pub trait SessionListener: Send + Sync + 'static {
    async fn on_status_changed(&self, status: ConnectionStatus);

    /// A local stream was opened, at startup or after a camera switch.
    async fn on_local_stream(&self, stream: &LocalStream);

    async fn on_remote_stream_added(&self, stream: RemoteStream);

    /// Called at most once per peer.
    async fn on_remote_stream_removed(&self);

    async fn on_message(&self, message: String);

    /// Recoverable failure; the session keeps running.
    async fn on_error(&self, error: SessionError);
}
