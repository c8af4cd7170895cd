//! Error types for bazaar-core.

use thiserror::Error;

/// Errors that can occur when building or parsing ledger primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Address is not valid base58 or not 32 bytes long.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Signature failed verification or could not be decoded.
    #[error("invalid signature")]
    InvalidSignature,

    /// Amount could not be parsed or overflowed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Fee rate above 10000 basis points.
    #[error("invalid fee rate: {0} bps exceeds 10000")]
    InvalidFeeRate(u16),

    /// Category outside the closed set.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Condition outside the closed set.
    #[error("unknown condition: {0}")]
    UnknownCondition(String),
}
