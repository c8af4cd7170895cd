//! # bazaar-cli
//!
//! Command-line tools for the Bazaar marketplace ledger.
//!
//! - `derive` computes account addresses from seed parts
//! - `replay` runs a JSON instruction script against a fresh in-memory ledger
//!   and optionally writes the resulting snapshot
//! - `query` filters the listings of a snapshot
//!
//! ```text
//! script.json ──replay──► state.json ──query──► listings
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use config::BazaarConfig;
pub use error::CliError;
pub use output::OutputFormat;
