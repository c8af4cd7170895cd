//! Account addresses and deterministic address derivation.
//!
//! Every ledger account lives at an address computed from a namespace and an
//! ordered list of seed byte-strings. Derivation hashes the seeds together with a
//! one-byte nonce ("bump"), walking the nonce down from 255 until the digest is
//! not a valid ed25519 point. A derived address therefore has no private key and
//! can never sign for itself.
//!
//! Seeds are length-prefixed before hashing, so `["ab", "c"]` and `["a", "bc"]`
//! never derive the same address. Callers are responsible for canonical seed
//! encodings: the same title encoded two different ways derives two accounts.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::CoreError;

/// Domain tag mixed into every derivation.
const DERIVATION_DOMAIN: &[u8] = b"bazaar/address/v1";

/// Namespaces used by the marketplace ledger.
pub mod namespace {
    /// Singleton marketplace account.
    pub const MARKETPLACE: &str = "marketplace";
    /// One user account per authority.
    pub const USER: &str = "user";
    /// One listing per (seller, title).
    pub const LISTING: &str = "listing";
    /// One purchase per (listing, buyer).
    pub const PURCHASE: &str = "purchase";
    /// One review per (purchase, reviewer).
    pub const REVIEW: &str = "review";
}

/// A 32-byte account identifier, displayed as base58.
///
/// Signer identities (ed25519 public keys) and derived accounts share this type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 32]);

impl Address {
    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidAddress` if the slice is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::InvalidAddress(format!("address must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the base58 encoding.
    #[must_use]
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Returns true if these bytes decode to an ed25519 point, i.e. the address
    /// could belong to a keypair.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

fn hash_seeds(namespace: &str, parts: &[&[u8]], bump: u8) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DERIVATION_DOMAIN);
    hasher.update(&(namespace.len() as u32).to_le_bytes());
    hasher.update(namespace.as_bytes());
    hasher.update(&(parts.len() as u32).to_le_bytes());
    for part in parts {
        hasher.update(&(part.len() as u32).to_le_bytes());
        hasher.update(part);
    }
    hasher.update(&[bump]);
    Address(*hasher.finalize().as_bytes())
}

/// Derives the address for `namespace` and `parts`, returning it with its bump.
///
/// Roughly half of all digests are valid curve points, so the search almost
/// always stops within the first few nonces. If all 256 candidates were on the
/// curve the bump-0 digest is returned; the function is total.
#[must_use]
pub fn find_address(namespace: &str, parts: &[&[u8]]) -> (Address, u8) {
    (0..=u8::MAX)
        .rev()
        .map(|bump| (hash_seeds(namespace, parts, bump), bump))
        .find(|(candidate, _)| !candidate.is_on_curve())
        .unwrap_or_else(|| (hash_seeds(namespace, parts, 0), 0))
}

/// Derives the address for `namespace` and `parts`.
#[must_use]
pub fn derive(namespace: &str, parts: &[&[u8]]) -> Address {
    find_address(namespace, parts).0
}

/// Address of the marketplace singleton.
#[must_use]
pub fn marketplace_address() -> (Address, u8) {
    find_address(namespace::MARKETPLACE, &[])
}

/// Address of the user account owned by `authority`.
#[must_use]
pub fn user_address(authority: &Address) -> (Address, u8) {
    find_address(namespace::USER, &[authority.as_ref()])
}

/// Address of the listing `title` created by `seller`.
#[must_use]
pub fn listing_address(seller: &Address, title: &str) -> (Address, u8) {
    find_address(namespace::LISTING, &[seller.as_ref(), title.as_bytes()])
}

/// Address of the purchase of `listing` by `buyer`.
#[must_use]
pub fn purchase_address(listing: &Address, buyer: &Address) -> (Address, u8) {
    find_address(namespace::PURCHASE, &[listing.as_ref(), buyer.as_ref()])
}

/// Address of the review of `purchase` written by `reviewer`.
#[must_use]
pub fn review_address(purchase: &Address, reviewer: &Address) -> (Address, u8) {
    find_address(namespace::REVIEW, &[purchase.as_ref(), reviewer.as_ref()])
}
