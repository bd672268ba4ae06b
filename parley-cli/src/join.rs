use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dialoguer::{Confirm, Input};
use parley_client::{CallEvent, CallManager, ClientConfig, SignalingClient, WebRtcEngine};
use parley_core::RoomId;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Args)]
pub struct JoinArgs {
    /// Signaling endpoint.
    #[arg(short, long, default_value = "ws://127.0.0.1:5050/ws")]
    url: String,

    /// Room to join; asked for interactively when omitted.
    #[arg(short, long)]
    room: Option<String>,

    /// Send ICE candidates as they are gathered.
    #[arg(long)]
    trickle: bool,

    /// Ask before answering incoming calls.
    #[arg(long)]
    ask: bool,

    /// Do not send local audio/video.
    #[arg(long)]
    receive_only: bool,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

pub async fn run(args: JoinArgs) -> Result<()> {
    let room = match args.room {
        Some(room) => room,
        None => Input::<String>::new()
            .with_prompt("Room")
            .interact_text()
            .context("Failed to read room name")?,
    };

    let config = ClientConfig {
        url: args.url.clone(),
        room: Some(RoomId::from(room)),
        trickle: args.trickle,
        auto_answer: !args.ask,
        negotiation_timeout: Duration::from_secs(args.timeout_secs),
        ..ClientConfig::default()
    };

    let engine = Arc::new(WebRtcEngine::new().context("Failed to initialise WebRTC")?);
    let (client, mut inbound) = SignalingClient::connect(&args.url)
        .await
        .with_context(|| format!("Failed to connect to {}", args.url))?;
    let (mut manager, mut events) = CallManager::new(config, engine, Arc::new(client.clone()));

    if !args.receive_only {
        let stream = manager.start_media().await?;
        println!("{} {}", "🎙  Local stream".cyan(), stream.id);
    }

    loop {
        tokio::select! {
            signal = inbound.recv() => {
                let Some(signal) = signal else {
                    println!("{}", "Signaling connection closed".red());
                    break;
                };
                if let Err(e) = manager.handle_signal(signal).await {
                    warn!("Failed to handle signal: {}", e);
                }
            }

            Some(event) = events.recv() => {
                print_event(&event);
                if let CallEvent::IncomingCall { caller } = event {
                    if ask(format!("Answer call from {}?", caller)).await? {
                        manager.answer(&caller);
                    } else {
                        manager.hang_up(&caller);
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Hanging up...".yellow());
                manager.hang_up_all()?;
                manager.leave_room()?;
                client.close().await;
                break;
            }
        }
    }

    Ok(())
}

async fn ask(prompt: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || Confirm::new().with_prompt(prompt).default(true).interact())
        .await?
        .context("Failed to read answer")
}

fn print_event(event: &CallEvent) {
    match event {
        CallEvent::Welcome { conn_id } => println!("{} {}", "✅ Connected as".green(), conn_id),
        CallEvent::RoomMembers { conn_ids } => {
            println!("{} {}", "👥 Already in room:".cyan(), conn_ids.len())
        }
        CallEvent::PeerJoined { conn_id } => println!("{} {}", "➕ Joined:".cyan(), conn_id),
        CallEvent::PeerLeft { conn_id } => println!("{} {}", "➖ Left:".yellow(), conn_id),
        CallEvent::PeerHungUp { conn_id } => println!("{} {}", "📴 Hung up:".yellow(), conn_id),
        CallEvent::IncomingCall { caller } => println!("{} {}", "📞 Incoming call from".cyan(), caller),
        CallEvent::RemoteStream { remote, stream } => {
            println!("{} {} from {}", "🎥 Remote".green(), stream.kind, remote)
        }
        CallEvent::Connected { remote } => println!("{} {}", "🔗 Media connected with".green().bold(), remote),
        CallEvent::Failed { remote, error } => println!("{} {}: {}", "❌ Call failed with".red(), remote, error),
        CallEvent::Closed { remote } => println!("{} {}", "Closed call with".dimmed(), remote),
        CallEvent::DeliveryFailed { target, event } => {
            println!("{} '{}' to {}", "⚠️  Could not deliver".red(), event, target)
        }
    }
}
