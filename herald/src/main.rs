//! CLI for herald.
//!
//! Loads a routing configuration and either validates it or replays a file of
//! host events through an in-memory bus, printing every event the router
//! published.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use herald::{AddressBook, EntityState, HeraldConfig, HostEvent, Replay};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay host events through the router
    Run {
        /// Routing configuration (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Entity states to seed the store with (JSON array)
        #[arg(long)]
        states: Option<PathBuf>,

        /// Host events to publish in order (JSON array of {event_type, data})
        #[arg(long)]
        events: PathBuf,

        /// Exit with an error if any delivery failed
        #[arg(long)]
        strict: bool,
    },
    /// Validate a configuration and list what it declares
    Check {
        /// Routing configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            states,
            events,
            strict,
        } => run(&config, states.as_deref(), &events, strict),
        Commands::Check { config } => check(&config),
    }
}

fn load_config(path: &Path) -> Result<HeraldConfig> {
    HeraldConfig::from_path(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn read_json<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn run(config: &Path, states: Option<&Path>, events: &Path, strict: bool) -> Result<()> {
    let config = load_config(config)?;
    let states: Vec<EntityState> = match states {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let inbound: Vec<HostEvent> = read_json(events)?;

    let replay = Replay::run(config, states, inbound)?;

    for event in &replay.published {
        println!("{}", serde_json::to_string(event)?);
    }
    for failure in &replay.failures {
        eprintln!(
            "failed: {} via {:?}: {}",
            failure.event_type, failure.gateway, failure.error
        );
    }
    if strict {
        replay.strict()?;
    }
    Ok(())
}

fn check(config: &Path) -> Result<()> {
    let config = load_config(config)?;
    let book = AddressBook::load(config.events, config.targets)?;

    println!("events:    {}", book.event_count());
    println!("targets:   {}", book.target_count());
    for name in book.listeners() {
        println!("listener:  {name}");
    }
    Ok(())
}
