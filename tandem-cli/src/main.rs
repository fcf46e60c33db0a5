mod commands;
mod listener;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use commands::{Command, HELP};
use dialoguer::Input;
use listener::ConsoleListener;
use std::sync::Arc;
use std::time::Duration;
use tandem::RoomId;
use tandem::model::IceServerConfig;
use tandem::session::{MediaParams, SessionConfig, WebRtcEngine, WsSignalingChannel, spawn_session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tandem-call")]
#[command(version, about = "Two-party video call through a signaling server")]
struct Cli {
    /// Signaling server WebSocket URL.
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    /// Room to join. Prompted for when omitted.
    #[arg(long)]
    room: Option<String>,

    /// STUN server URL, repeatable. Defaults to Google's public server.
    #[arg(long)]
    stun: Vec<String>,

    /// Audio only.
    #[arg(long)]
    no_video: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Limit for each negotiation step.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn session_config(&self, room_id: RoomId) -> SessionConfig {
        let mut config = SessionConfig::new(room_id);

        if !self.stun.is_empty() {
            config.ice_servers = self.stun.iter().map(IceServerConfig::stun).collect();
        }
        config.media = MediaParams {
            video_enabled: !self.no_video,
            video_width: self.width,
            video_height: self.height,
            video_fps: self.fps,
            ..MediaParams::default()
        };
        config.negotiation_timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let room_id = match &cli.room {
        Some(room) => RoomId::new(room.as_str()),
        None => prompt_room()?,
    };
    let config = cli.session_config(room_id.clone());

    println!(
        "{} {}",
        "🚀 Joining room".green().bold(),
        room_id.as_str().cyan().bold()
    );

    let (channel, channel_rx) = WsSignalingChannel::connect(&cli.server)
        .await
        .with_context(|| format!("Failed to reach signaling server at {}", cli.server))?;
    info!("Connected to signaling server {}", cli.server);

    let (handle, mut task) = spawn_session(
        config,
        Arc::new(WebRtcEngine::new()),
        Arc::new(channel),
        channel_rx,
        Box::new(ConsoleListener),
    );

    println!("{}\n{}", "Commands:".cyan(), HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };

                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => println!("{}", HELP),
                    Ok(Some(cmd)) => cmd.apply(&handle).await?,
                    Ok(None) => {}
                    Err(e) => {
                        debug!("Rejected input {:?}: {}", line, e);
                        println!("{} {}", "⚠️".yellow(), e);
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }

            res = &mut task => {
                res.context("Session task failed")?;
                info!("Session for room {} ended", room_id);
                println!("{}", "Session ended".dimmed());
                return Ok(());
            }
        }
    }

    println!("{}", "👋 Leaving...".cyan());
    if let Err(e) = handle.shutdown().await {
        warn!("Session already stopped: {}", e);
    }
    task.await.context("Session task failed")?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn prompt_room() -> Result<RoomId> {
    let room: String = Input::new()
        .with_prompt("Room id")
        .default(RoomId::random().to_string())
        .interact_text()
        .context("Failed to read room id")?;

    Ok(RoomId::new(room.trim()))
}
