//! CLI command implementations.
//!
//! - [`derive`] - Account address derivation
//! - [`replay`] - Instruction script replay against a fresh ledger
//! - [`query`] - Listing filters over a ledger snapshot

pub mod derive;
pub mod query;
pub mod replay;

pub use derive::DeriveCommand;
pub use query::QueryCommand;
pub use replay::{ReplayCommand, ReplayScript};
