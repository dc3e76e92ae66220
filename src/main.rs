//! # ChoreRank — chat-driven chore checklist with points and monthly standings
//!
//! Usage:
//!   chorerank                          # Run the bot on the console transport
//!   chorerank --config ./chorerank.toml
//!   chorerank --init-config            # Write the effective config and exit

mod notifier;

use std::sync::Arc;

use anyhow::Result;
use chorerank_agent::Dispatcher;
use chorerank_channels::{
    Backoff, ConsoleTransport, FileCredentialStore, SessionRuntime, TerminalPairingDisplay,
    Transport,
};
use chorerank_core::ChoreRankConfig;
use chorerank_core::config::expand_path;
use chorerank_scheduler::{Orchestrator, WallClock, triggers_from_config};
use chorerank_store::{ScoreDb, StoreHandle};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::notifier::OutboxNotifier;

/// Inbound messages waiting for the dispatcher.
const INBOUND_BUFFER: usize = 64;

#[derive(Parser)]
#[command(
    name = "chorerank",
    version,
    about = "🏆 ChoreRank — chore checklist, points and monthly ranking over chat"
)]
struct Cli {
    /// Config file (default: ~/.chorerank/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Database path, overrides [storage] db_path
    #[arg(long)]
    db_path: Option<String>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = [
        "chorerank",
        "chorerank_store",
        "chorerank_scheduler",
        "chorerank_channels",
        "chorerank_agent",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let explicit_path = cli.config.as_deref().map(expand_path);
    let mut config = match &explicit_path {
        Some(path) if path.exists() => ChoreRankConfig::load_from(path)?,
        Some(_) => ChoreRankConfig::default(),
        None => ChoreRankConfig::load()?,
    };
    let config_path = explicit_path.unwrap_or_else(ChoreRankConfig::default_path);
    if let Some(db_path) = cli.db_path {
        config.storage.db_path = db_path;
    }

    if cli.init_config {
        config.save_to(&config_path)?;
        println!("✅ Config written to {}", config_path.display());
        return Ok(());
    }

    // Store
    let db_path = expand_path(&config.storage.db_path);
    let store = StoreHandle::new(ScoreDb::open(&db_path, config.scoring.penalty)?);

    // Session
    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new());
    let credentials_path = expand_path(&config.session.credentials_path);
    let session = SessionRuntime::new(
        transport,
        Arc::new(FileCredentialStore::new(&credentials_path)),
        Arc::new(TerminalPairingDisplay),
        Backoff::from_config(&config.session),
    );
    let outbox = session.outbox();
    let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_BUFFER);
    let session_task = tokio::spawn(async move {
        if let Err(e) = session.run(inbound_tx).await {
            tracing::error!("Session stopped: {e}");
        }
    });

    // Scheduled workflows
    let notifier = Arc::new(OutboxNotifier::new(outbox.clone(), config.notify.target.clone()));
    let clock = Arc::new(WallClock::new(config.schedule.utc_offset_minutes)?);
    let orchestrator = Orchestrator::new(store.clone(), notifier, clock);
    let scheduler = orchestrator.run(triggers_from_config(&config.schedule));
    tokio::pin!(scheduler);
    let mut scheduler_running = true;

    println!("🏆 ChoreRank v{}", env!("CARGO_PKG_VERSION"));
    println!("   🗄️  Database:    {}", db_path.display());
    println!("   🔑 Credentials: {}", credentials_path.display());
    if config.notify.target.is_empty() {
        println!("   📣 Notify:      (not set, scheduled notices are only logged)");
    } else {
        println!("   📣 Notify:      {}", config.notify.target);
    }
    println!("   ⌨️  Type `help`, or `chat> text` to speak in a named chat.");
    println!();

    // Inbound messages → dispatcher → reply
    let dispatcher = Dispatcher::new(store);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            msg = inbound_rx.recv() => {
                let Some(msg) = msg else { break };
                if let Some(reply) = dispatcher.handle(&msg).await {
                    if let Err(e) = outbox.send(&msg.thread_id, &reply).await {
                        tracing::warn!("⚠️ Reply to {} dropped: {e}", msg.thread_id);
                    }
                }
            }
            _ = &mut scheduler, if scheduler_running => {
                scheduler_running = false;
                tracing::warn!("⏰ No trigger left to fire, chat commands keep working");
            }
            _ = &mut shutdown => {
                tracing::info!("👋 Shutting down");
                break;
            }
        }
    }

    session_task.abort();
    Ok(())
}
