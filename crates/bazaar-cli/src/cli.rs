//! Command-line argument parsing with clap.

use std::path::PathBuf;

use bazaar_core::{Address, Category, Condition, Lamports};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Bazaar - peer-to-peer marketplace ledger tools.
#[derive(Parser, Debug, Clone)]
#[command(name = "bazaar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, env = "BAZAAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Derive an account address from a namespace and seed parts.
    Derive(DeriveArgs),

    /// Run an instruction script against a fresh ledger.
    Replay(ReplayArgs),

    /// Filter the listings of a ledger snapshot.
    Query(QueryArgs),
}

/// Arguments for the derive command.
#[derive(Args, Debug, Clone)]
pub struct DeriveArgs {
    /// Namespace, e.g. `listing`.
    pub namespace: String,

    /// Seed parts: base58 addresses, or `text:<utf-8>` for raw text.
    pub parts: Vec<String>,
}

/// Arguments for the replay command.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Instruction script (JSON).
    pub script: PathBuf,

    /// Write the final ledger snapshot here.
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Stop at the first rejected instruction.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the query command.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Ledger snapshot (JSON).
    pub snapshot: PathBuf,

    /// Exact category.
    #[arg(long)]
    pub category: Option<Category>,

    /// Exact condition.
    #[arg(long)]
    pub condition: Option<Condition>,

    /// Minimum price in SOL, inclusive.
    #[arg(long, value_name = "SOL")]
    pub min_price: Option<Lamports>,

    /// Maximum price in SOL, inclusive.
    #[arg(long, value_name = "SOL")]
    pub max_price: Option<Lamports>,

    /// Case-insensitive text in title or description.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Case-insensitive text in the seller's profile location.
    #[arg(long)]
    pub location: Option<String>,

    /// Exact seller identity.
    #[arg(long)]
    pub seller: Option<Address>,

    /// Only listings with a verified seller.
    #[arg(long)]
    pub verified: bool,

    /// Only listings that are still for sale.
    #[arg(long)]
    pub active: bool,
}
