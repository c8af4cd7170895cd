//! CLI error types.

use bazaar_ledger::LedgerError;
use bazaar_query::QueryError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed replay script.
    #[error("script error: {0}")]
    Script(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// Ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Query could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
