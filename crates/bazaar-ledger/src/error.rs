//! Error types for bazaar-ledger.

use std::fmt;

use bazaar_core::Address;
use bazaar_reputation::ReputationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transfer::TransferError;

/// The kind of a ledger account, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    /// The marketplace singleton.
    Marketplace,
    /// A user profile.
    User,
    /// A listing.
    Listing,
    /// A purchase.
    Purchase,
    /// A review.
    Review,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marketplace => write!(f, "marketplace"),
            Self::User => write!(f, "user"),
            Self::Listing => write!(f, "listing"),
            Self::Purchase => write!(f, "purchase"),
            Self::Review => write!(f, "review"),
        }
    }
}

/// Broad class of a ledger failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Field length or range violation.
    Validation,
    /// Signer does not match the required identity.
    Authorization,
    /// A precondition on an existing account failed.
    StateConflict,
    /// A referenced account does not exist.
    NotFound,
    /// The asset transfer backing the instruction failed.
    Transfer,
    /// Overflow, serialization or storage failure.
    Internal,
}

/// Errors returned by ledger instructions.
///
/// Every failed instruction leaves the ledger exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Display name longer than the configured limit.
    #[error("display name too long: {len} bytes (max {max})")]
    DisplayNameTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Bio longer than the configured limit.
    #[error("bio too long: {len} bytes (max {max})")]
    BioTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Location longer than the configured limit.
    #[error("location too long: {len} bytes (max {max})")]
    LocationTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Listing title longer than the configured limit.
    #[error("title too long: {len} bytes (max {max})")]
    TitleTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Listing description longer than the configured limit.
    #[error("description too long: {len} bytes (max {max})")]
    DescriptionTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Image or metadata URI longer than the configured limit.
    #[error("uri too long: {len} bytes (max {max})")]
    UriTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Review comment longer than the configured limit.
    #[error("comment too long: {len} bytes (max {max})")]
    CommentTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Verification attestation reference longer than the configured limit.
    #[error("attestation reference too long: {len} bytes (max {max})")]
    AttestationTooLong {
        /// Actual length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Fee rate above 10000 basis points.
    #[error("invalid fee rate: {0} bps exceeds 10000")]
    InvalidFeeRate(u16),

    /// Listing price of zero.
    #[error("listing price must be greater than zero")]
    InvalidPrice,

    /// Review rating outside `1..=5`.
    #[error("invalid rating: {0} (must be 1-5)")]
    InvalidRating(u8),

    /// Signer is not the identity the instruction requires.
    #[error("unauthorized: expected signer {expected}, got {actual}")]
    Unauthorized {
        /// Identity allowed to sign.
        expected: Address,
        /// Identity that signed.
        actual: Address,
    },

    /// The account the instruction would create already exists.
    #[error("{kind} account already exists: {address}")]
    AccountAlreadyExists {
        /// Account kind.
        kind: AccountKind,
        /// Derived address.
        address: Address,
    },

    /// A referenced account does not exist.
    #[error("{kind} account not found: {address}")]
    AccountNotFound {
        /// Account kind.
        kind: AccountKind,
        /// Address looked up.
        address: Address,
    },

    /// Listing is inactive or already sold.
    #[error("listing not purchasable: {0}")]
    ListingNotPurchasable(Address),

    /// Listing is sold and can no longer change status.
    #[error("listing already sold: {0}")]
    ListingAlreadySold(Address),

    /// Review attempted before the purchase was completed.
    #[error("review requires a completed purchase: {0}")]
    ReviewRequiresCompletedPurchase(Address),

    /// Purchase has already been completed.
    #[error("purchase already completed: {0}")]
    PurchaseAlreadyCompleted(Address),

    /// Purchase is under dispute.
    #[error("purchase is disputed: {0}")]
    PurchaseDisputed(Address),

    /// Signature does not verify against the claimed signer.
    #[error("invalid instruction signature")]
    InvalidSignature,

    /// The asset transfer failed; no state was changed.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// Invalid ledger configuration.
    #[error("invalid ledger config: {0}")]
    InvalidConfig(String),

    /// A counter or amount would overflow.
    #[error("overflow: {0}")]
    Overflow(&'static str),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Snapshot file could not be read or written.
    #[error("io error: {0}")]
    Io(String),

    /// Snapshot accounts contradict each other or their derived addresses.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl LedgerError {
    /// The failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::DisplayNameTooLong { .. }
            | Self::BioTooLong { .. }
            | Self::LocationTooLong { .. }
            | Self::TitleTooLong { .. }
            | Self::DescriptionTooLong { .. }
            | Self::UriTooLong { .. }
            | Self::CommentTooLong { .. }
            | Self::AttestationTooLong { .. }
            | Self::InvalidFeeRate(_)
            | Self::InvalidPrice
            | Self::InvalidRating(_)
            | Self::InvalidConfig(_) => ErrorClass::Validation,
            Self::Unauthorized { .. } | Self::InvalidSignature => ErrorClass::Authorization,
            Self::AccountAlreadyExists { .. }
            | Self::ListingNotPurchasable(_)
            | Self::ListingAlreadySold(_)
            | Self::ReviewRequiresCompletedPurchase(_)
            | Self::PurchaseAlreadyCompleted(_)
            | Self::PurchaseDisputed(_) => ErrorClass::StateConflict,
            Self::AccountNotFound { .. } => ErrorClass::NotFound,
            Self::TransferFailed(_) => ErrorClass::Transfer,
            Self::Overflow(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::CorruptSnapshot(_) => ErrorClass::Internal,
        }
    }

    pub(crate) const fn not_found(kind: AccountKind, address: Address) -> Self {
        Self::AccountNotFound { kind, address }
    }

    pub(crate) const fn already_exists(kind: AccountKind, address: Address) -> Self {
        Self::AccountAlreadyExists { kind, address }
    }
}

impl From<ReputationError> for LedgerError {
    fn from(e: ReputationError) -> Self {
        match e {
            ReputationError::InvalidRating(rating) => Self::InvalidRating(rating),
            ReputationError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            ReputationError::Overflow => Self::Overflow("reputation counters"),
            other @ ReputationError::ChainBroken { .. } => Self::Serialization(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(LedgerError::BioTooLong { len: 501, max: 500 }, ErrorClass::Validation ; "length")]
    #[test_case(LedgerError::InvalidRating(0), ErrorClass::Validation ; "rating")]
    #[test_case(LedgerError::InvalidSignature, ErrorClass::Authorization ; "signature")]
    #[test_case(LedgerError::ListingNotPurchasable(Address::default()), ErrorClass::StateConflict ; "not purchasable")]
    #[test_case(LedgerError::not_found(AccountKind::User, Address::default()), ErrorClass::NotFound ; "not found")]
    #[test_case(LedgerError::Overflow("total_users"), ErrorClass::Internal ; "overflow")]
    #[test_case(LedgerError::CorruptSnapshot("total_users".to_string()), ErrorClass::Internal ; "corrupt snapshot")]
    fn classifies(error: LedgerError, class: ErrorClass) {
        assert_eq!(error.class(), class);
    }

    #[test]
    fn messages_name_the_account() {
        let err = LedgerError::already_exists(AccountKind::Listing, Address::new([1; 32]));
        assert!(err.to_string().starts_with("listing account already exists"));
    }

    #[test]
    fn reputation_rating_error_maps_to_invalid_rating() {
        let err: LedgerError = ReputationError::InvalidRating(9).into();
        assert_eq!(err, LedgerError::InvalidRating(9));
    }
}
