//! Error types for bazaar-reputation.

use bazaar_core::Address;
use thiserror::Error;

/// Errors that can occur while updating or verifying reputation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReputationError {
    /// Rating outside `1..=5`.
    #[error("invalid rating: {0} (must be 1-5)")]
    InvalidRating(u8),

    /// Configuration value out of range.
    #[error("invalid reputation config: {0}")]
    InvalidConfig(String),

    /// A record does not chain from its predecessor.
    #[error("attestation chain broken for {subject} at sequence {sequence}")]
    ChainBroken {
        /// Subject whose history is inconsistent.
        subject: Address,
        /// First sequence number that fails verification.
        sequence: u64,
    },

    /// A counter would overflow.
    #[error("reputation counter overflow")]
    Overflow,
}
