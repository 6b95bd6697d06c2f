//! cutbridge CLI: runs the clipboard bridge against the desktop clipboard.

mod logging;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cutbridge_clipboard::native::ArboardClipboard;
use cutbridge_clipboard::transcode::to_wire;
use cutbridge_clipboard::{ClipboardBridge, InboundOutcome, SyncPolicy};
use cutbridge_daemon::config::Config;
use cutbridge_daemon::setup::load_config;
use cutbridge_daemon::{channel_link, BridgeDaemon, BridgeEvent, BroadcastChain};
use cutbridge_types::OwnerId;

#[derive(Parser)]
#[command(
    name = "cutbridge",
    about = "Bridge the desktop clipboard to a remote viewer's cut text",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and print the cut text a peer would receive.
    Watch {
        /// Start with clipboard sync turned off.
        #[arg(long)]
        disable_clipboard: bool,
    },

    /// Install TEXT as if a peer had sent it.
    Push {
        /// Cut text in wire form (LF line endings).
        text: String,
    },

    /// Print the clipboard text in wire form.
    Show,

    /// Print the default configuration.
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::DefaultConfig = cli.command {
        print!("{}", toml::to_string_pretty(&Config::default())?);
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.logging);

    match cli.command {
        Commands::Watch { disable_clipboard } => {
            if disable_clipboard {
                config.clipboard.enabled = false;
            }
            watch(config).await?;
        }
        Commands::Push { text } => {
            let bridge = local_bridge(&config)?;
            let outcome = tokio::task::spawn_blocking(move || bridge.on_remote_text(text.as_bytes()))
                .await??;
            match outcome {
                InboundOutcome::Installed { len } => println!("installed {len} bytes"),
                InboundOutcome::Disabled => println!("clipboard sync is disabled"),
            }
        }
        Commands::Show => {
            let bridge = local_bridge(&config)?;
            let text = tokio::task::spawn_blocking(move || {
                let mut lease = bridge.guard().acquire(bridge.identity())?;
                let text = lease.read_text()?;
                lease.release()?;
                Ok::<_, anyhow::Error>(text)
            })
            .await??;
            match text {
                Some(text) => {
                    let wire = to_wire(text.as_bytes());
                    println!("{}", String::from_utf8_lossy(wire.as_bytes()));
                }
                None => eprintln!("clipboard holds no text"),
            }
        }
        Commands::DefaultConfig => {}
    }

    Ok(())
}

/// Run the bridge until Ctrl-C, echoing outbound cut text to stdout.
async fn watch(config: Config) -> anyhow::Result<()> {
    let port = ArboardClipboard::new().context("opening the system clipboard")?;
    let capacity = config.bridge.channel_capacity;
    let chain = BroadcastChain::new(capacity);
    let (link, remote) = channel_link(capacity, config.bridge.send_timeout());

    let mut daemon = BridgeDaemon::new(config, port, link, Arc::new(chain));
    let events = daemon.event_sender();

    // Holding the inbound sender keeps the peer side connected.
    let (_to_local, mut from_local) = remote.into_parts();
    tokio::spawn(async move {
        while let Some(text) = from_local.recv().await {
            println!("{}", String::from_utf8_lossy(&text));
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C");
            let _ = events.send(BridgeEvent::Shutdown).await;
        }
    });

    daemon.run().await?;
    Ok(())
}

fn local_bridge(config: &Config) -> anyhow::Result<ClipboardBridge<ArboardClipboard>> {
    let port = ArboardClipboard::new().context("opening the system clipboard")?;
    Ok(ClipboardBridge::new(
        port,
        OwnerId::new(),
        SyncPolicy::new(config.clipboard.enabled),
        config.retry.policy(),
    )
    .with_max_size(config.clipboard.max_size))
}
