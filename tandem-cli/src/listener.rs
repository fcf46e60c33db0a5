use async_trait::async_trait;
use colored::*;
use tandem::session::{
    ConnectionStatus, LocalStream, RemoteStream, SessionError, SessionListener,
};

/// Prints session callbacks to the terminal.
pub struct ConsoleListener;

#[async_trait]
impl SessionListener for ConsoleListener {
    async fn on_status_changed(&self, status: ConnectionStatus) {
        let label = match status {
            ConnectionStatus::Connecting => status.as_str().yellow(),
            ConnectionStatus::Connected => status.as_str().green(),
            ConnectionStatus::Disconnected => status.as_str().red(),
        };
        println!("{} {}", "●".bold(), label.bold());
    }

    async fn on_local_stream(&self, stream: &LocalStream) {
        println!(
            "{} Local stream {} ({:?} camera, {} track(s))",
            "🎥".cyan(),
            stream.id(),
            stream.facing(),
            stream.tracks().len()
        );
    }

    async fn on_remote_stream_added(&self, stream: RemoteStream) {
        println!(
            "{} Receiving remote {} from {}",
            "📺".green(),
            stream.kind,
            stream.stream_id
        );
    }

    async fn on_remote_stream_removed(&self) {
        println!("{}", "📴 Remote stream gone".dimmed());
    }

    async fn on_message(&self, message: String) {
        println!("{} {}", "💬".blue(), message);
    }

    async fn on_error(&self, error: SessionError) {
        eprintln!("{} {}", "⚠️".yellow(), error.to_string().yellow());
    }
}
