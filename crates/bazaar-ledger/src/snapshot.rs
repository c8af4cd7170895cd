//! Point-in-time copies of the ledger, persisted as JSON.

use std::fs;
use std::path::Path;

use bazaar_core::{Listing, Marketplace, Purchase, Review, UserAccount};
use bazaar_reputation::AttestationLog;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Every account and reputation record at one instant.
///
/// Account lists are ordered by address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// The marketplace singleton, once initialized.
    pub marketplace: Option<Marketplace>,
    /// User accounts.
    pub users: Vec<UserAccount>,
    /// Listings.
    pub listings: Vec<Listing>,
    /// Purchases.
    pub purchases: Vec<Purchase>,
    /// Reviews.
    pub reviews: Vec<Review>,
    /// Reputation history.
    pub attestations: AttestationLog,
}

impl LedgerSnapshot {
    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Serialization` on malformed input, including a
    /// broken attestation chain.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Writes the snapshot to a file, replacing it.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
