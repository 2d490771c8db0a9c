//! ts-term CLI
//!
//! Attaches the local terminal to an SSH session brokered by a ts-term
//! server over two WebSocket channels, and offers a few helpers around it:
//! - `connect` (default): pick a machine, authenticate, run the session
//! - `peers`: list the machines the server can reach
//! - `config`: inspect or create the configuration file

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ts_term::commands;
use tt_core::config::{self, ClientConfig};
use tt_core::AddressKind;

#[derive(Parser)]
#[command(name = "ts-term")]
#[command(author, version, about = "Terminal sessions over Tailscale, brokered by a ts-term server")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TS_TERM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log file used while a session is attached
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for where the server lives
#[derive(Args, Default)]
struct ServerArgs {
    /// Server host[:port] (overrides config)
    #[arg(short, long)]
    server: Option<String>,

    /// Use secure WebSockets (wss)
    #[arg(long)]
    secure: bool,
}

#[derive(Args, Default)]
struct ConnectArgs {
    #[command(flatten)]
    server: ServerArgs,

    /// Username offered in the connection form
    #[arg(short, long)]
    user: Option<String>,

    /// SSH port offered in the connection form
    #[arg(short, long)]
    port: Option<u16>,

    /// Peer address to connect to: short, full or ip
    #[arg(short, long)]
    address_kind: Option<AddressKind>,

    /// Machine to select without asking (name, domain or IP)
    machine: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a session on a peer (the default)
    Connect(ConnectArgs),

    /// List the peers the server can reach
    Peers {
        #[command(flatten)]
        server: ServerArgs,

        /// Seconds to wait for the peer list
        #[arg(short, long, default_value_t = 10)]
        timeout: u64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Connect(ConnectArgs::default()));

    let attached = matches!(command, Commands::Connect(_));
    init_logging(cli.verbose, cli.quiet, attached, cli.log_file)?;

    match command {
        Commands::Connect(args) => {
            let mut config = commands::resolve_config(cli.config.as_ref())?;
            apply_server_args(&mut config, args.server);
            if let Some(user) = args.user {
                config.default_username = user;
            }
            if let Some(port) = args.port {
                config.default_port = port;
            }
            if let Some(kind) = args.address_kind {
                config.address_kind = kind;
            }

            commands::connect_command(config, args.machine).await?;
        }

        Commands::Peers { server, timeout } => {
            let mut config = commands::resolve_config(cli.config.as_ref())?;
            apply_server_args(&mut config, server);
            config.validate().context("Invalid configuration")?;

            commands::peers_command(&config, Duration::from_secs(timeout)).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(cli.config.as_ref())?,
            ConfigAction::Path => commands::config_path(cli.config.as_ref())?,
            ConfigAction::Init { force } => commands::config_init(cli.config.as_ref(), force)?,
        },
    }

    Ok(())
}

fn apply_server_args(config: &mut ClientConfig, args: ServerArgs) {
    if let Some(server) = args.server {
        config.server = server;
    }
    if args.secure {
        config.secure = true;
    }
}

/// Set up tracing
///
/// An attached session owns the terminal, so its logs go to a file.
fn init_logging(verbose: u8, quiet: bool, attached: bool, log_file: Option<PathBuf>) -> Result<()> {
    let log_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()));

    if attached {
        let path = log_file.unwrap_or_else(config::default_log_path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
