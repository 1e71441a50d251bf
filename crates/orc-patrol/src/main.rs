mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coordination::OrcConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (defaults plus ORC_* environment overrides when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON snapshot shared by every orc-patrol process
    #[arg(long, global = true, default_value = ".orc/state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one patrol loop per configured seat until interrupted
    Watch {
        /// Only patrol these seats (repeatable)
        #[arg(long = "seat")]
        seats: Vec<String>,
    },

    /// Mark a patrol completed; a running `watch` exits its loop on the next tick
    Stop { patrol_id: String },

    /// Show active patrols and their open stucks
    Status {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List pending escalations
    Escalations {
        /// Only escalations routed to this actor
        #[arg(long)]
        actor: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Resolve a pending escalation
    Resolve {
        escalation_id: String,

        #[arg(long)]
        resolution: String,

        /// Acting user (defaults to the routing default actor)
        #[arg(long)]
        actor: Option<String>,
    },

    /// Dismiss a pending escalation
    Dismiss {
        escalation_id: String,

        #[arg(long)]
        actor: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<OrcConfig> {
    match path {
        Some(path) => OrcConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => OrcConfig::from_env().context("invalid configuration from environment"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args.config.as_ref())?;
    let state = args.state.as_path();

    match args.command {
        Command::Watch { seats } => commands::watch(&config, state, &seats).await,
        Command::Stop { patrol_id } => commands::stop(&config, state, &patrol_id),
        Command::Status { json } => commands::status(&config, state, json),
        Command::Escalations { actor, json } => {
            commands::escalations(&config, state, actor.as_deref(), json)
        }
        Command::Resolve {
            escalation_id,
            resolution,
            actor,
        } => commands::resolve(&config, state, &escalation_id, &resolution, actor.as_deref()),
        Command::Dismiss {
            escalation_id,
            actor,
        } => commands::dismiss(&config, state, &escalation_id, actor.as_deref()),
    }
}
