mod cli_config;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cli_config::CliConfig;
use colored::*;
use dialoguer::Input;
use ghost_putt::model::{MessageKind, Player, now_millis};
use ghost_putt::relay;
use ghost_putt::session::storage::{
    FileStore, MemoryStore, SessionStorage, room_code_from_url, shareable_link,
};
use ghost_putt::session::{
    KeyValueStore, MessageProtocol, PeerManager, PeerManagerHandle, SessionEvent,
};
use ghost_putt::{PeerId, RoomCode};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PLAYER_COLORS: [&str; 8] = [
    "#ef4444", "#3b82f6", "#22c55e", "#eab308", "#a855f7", "#ec4899", "#14b8a6", "#f97316",
];

#[derive(Parser)]
#[command(name = "ghost-putt", about = "Ghost Putt peer-to-peer sessions")]
struct Cli {
    /// TOML file with [session] and [relay] sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides session.relay_url.
    #[arg(long, global = true)]
    relay_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print fresh room codes.
    Code {
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },

    /// Run the signaling relay.
    Relay {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Host a room and stay in it until Ctrl-C.
    Host {
        #[arg(short, long)]
        name: Option<String>,

        /// Host this code instead of a random one.
        #[arg(long)]
        code: Option<String>,
    },

    /// Join a room by code (or shared link) and host id.
    Join {
        /// Room code, `ABC-DEF` form accepted, or a shared link.
        room: String,

        host: String,

        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.relay_url {
        config.session.relay_url = url;
    }

    match cli.command {
        Commands::Code { count } => {
            for _ in 0..count.max(1) {
                println!("{}", RoomCode::generate().display().bold());
            }
        }

        Commands::Relay { bind } => {
            let mut relay_config = config.relay;
            if let Some(bind) = bind {
                relay_config.bind = bind;
            }
            println!(
                "{}",
                format!("📡 Relay on ws://{}{}", relay_config.bind, relay_config.path)
                    .green()
                    .bold()
            );
            relay::serve(relay_config).await?;
        }

        Commands::Host { name, code } => {
            let storage = open_storage(&config);
            let name = player_name(name, &storage)?;
            let code = match code {
                Some(raw) => RoomCode::parse(&raw)?,
                None => RoomCode::generate(),
            };

            let manager = PeerManager::spawn_networked(config.session.clone());
            let local = manager
                .create_host_connection(code.clone())
                .await
                .context("Failed to create room")?;
            storage.save_room_code(&code);

            println!("{}", "⛳ Room open".green().bold());
            println!("   Code:    {}", code.display().bold());
            println!("   Host id: {}", local.as_str().cyan());
            println!("   Link:    {}", shareable_link(&config.link_base, &code)?);

            add_local_player(&manager, &local, &name, true).await;
            run_until_interrupted(&manager, &local).await;
        }

        Commands::Join { room, host, name } => {
            let storage = open_storage(&config);
            let name = player_name(name, &storage)?;
            let code = parse_room(&room)?;

            let manager = PeerManager::spawn_networked(config.session.clone());
            println!("{}", format!("🔗 Joining {}...", code.display()).cyan());
            let local = manager
                .join_room(code.clone(), PeerId::from(host))
                .await
                .context("Failed to join room")?;
            storage.save_room_code(&code);
            println!("{}", "⛳ Connected to host".green().bold());

            add_local_player(&manager, &local, &name, false).await;
            run_until_interrupted(&manager, &local).await;
        }
    }

    Ok(())
}

fn open_storage(config: &CliConfig) -> SessionStorage {
    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => Arc::new(FileStore::open(path)),
        None => Arc::new(MemoryStore::new()),
    };
    SessionStorage::new(store)
}

fn player_name(flag: Option<String>, storage: &SessionStorage) -> Result<String> {
    let name = match flag.or_else(|| storage.player_name()) {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Player name")
            .interact_text()
            .context("Failed to read player name")?,
    };
    let name = name.trim().to_owned();
    if name.is_empty() {
        bail!("Player name cannot be empty");
    }
    storage.save_player_name(&name);
    Ok(name)
}

fn parse_room(raw: &str) -> Result<RoomCode> {
    if let Some(code) = room_code_from_url(raw) {
        return Ok(code);
    }
    Ok(RoomCode::parse(raw)?)
}

async fn add_local_player(manager: &PeerManagerHandle, local: &PeerId, name: &str, is_host: bool) {
    let state = manager.state();
    let mut state = state.write().await;
    let color = PLAYER_COLORS[state.players.len() % PLAYER_COLORS.len()];
    let player = Player {
        id: local.to_string(),
        name: name.to_owned(),
        color: color.to_owned(),
        is_host,
        joined_at: now_millis(),
    };
    state.add_player(player.clone());
    drop(state);

    let announcement =
        MessageProtocol::encode(MessageKind::PlayerJoined, json!(player), local.as_str());
    if let Err(e) = manager.broadcast(announcement).await {
        warn!("Could not announce {}: {}", name, e);
    }
}

async fn run_until_interrupted(manager: &PeerManagerHandle, local: &PeerId) {
    let mut events = manager.subscribe();
    println!("{}", "Press Ctrl-C to leave.".dimmed());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(n)) => eprintln!("{}", format!("(skipped {n} events)").dimmed()),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let leaving = MessageProtocol::encode(
        MessageKind::PlayerLeft,
        json!({ "playerId": local.as_str() }),
        local.as_str(),
    );
    let _ = manager.broadcast(leaving).await;
    manager.disconnect().await;
    info!("Session for {} closed", local);
    println!("{}", "👋 Left the room".yellow());
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::PeerConnected(peer) => {
            println!("{} {}", "+".green().bold(), peer.as_str());
        }
        SessionEvent::PeerDisconnected(peer) => {
            println!("{} {}", "-".red().bold(), peer.as_str());
        }
        SessionEvent::LinkFailed { peer_id, reason } => {
            println!("{} {}: {}", "!".red().bold(), peer_id.as_str(), reason);
        }
        SessionEvent::MessageDispatched { message, outcome, .. } => {
            if message.kind != MessageKind::StateUpdate {
                println!(
                    "{} {} from {} ({:?})",
                    "»".cyan(),
                    message.kind,
                    message.from_player_id,
                    outcome
                );
            }
        }
    }
}
