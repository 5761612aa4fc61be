//! statedb CLI - Command Line Interface

mod commands;

use clap::{Parser, Subcommand};
use statedb_core::LedgerConfig;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "statedb")]
#[command(about = "statedb - append-only transaction ledger")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory holding genesis.json and tx.db
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Logging level (overrides the configuration file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a genesis file and an empty ledger
    Init {
        /// Chain ID
        #[arg(long, default_value = "statedb-devnet")]
        chain_id: String,

        /// Initial balance, as name=amount (repeatable)
        #[arg(long = "alloc", value_parser = commands::parse_allocation)]
        allocations: Vec<(String, u64)>,

        /// Replace an existing genesis file
        #[arg(long)]
        force: bool,
    },

    /// List account balances
    Balances,

    /// Transfer tokens and persist the transaction
    Send {
        /// Sender account
        #[arg(short, long)]
        from: String,

        /// Recipient account
        #[arg(short, long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        value: u64,

        /// Free-form note stored with the transaction
        #[arg(long, default_value = "")]
        data: String,
    },

    /// Credit a reward and persist the transaction
    Reward {
        /// Recipient account
        #[arg(short, long)]
        to: String,

        /// Amount to credit
        #[arg(short, long)]
        value: u64,

        /// Account recorded as the origin (defaults to the recipient)
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Show chain and ledger status
    Status,

    /// Replay the ledger twice and compare the resulting state roots
    Verify,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init {
            chain_id,
            allocations,
            force,
        } => commands::init(&config, chain_id, allocations, force),
        Commands::Balances => commands::balances(&config),
        Commands::Send {
            from,
            to,
            value,
            data,
        } => commands::send(&config, from, to, value, data),
        Commands::Reward { to, value, from } => {
            let from = from.unwrap_or_else(|| to.clone());
            commands::reward(&config, from, to, value)
        }
        Commands::Status => commands::status(&config),
        Commands::Verify => commands::verify(&config),
    }
}
