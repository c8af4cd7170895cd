//! # bazaar-core
//!
//! Ledger primitives for the Bazaar peer-to-peer marketplace.
//!
//! This crate provides:
//!
//! - [`Address`] - 32-byte account identifier shared by signers and derived accounts
//! - [`address`] - deterministic address derivation from a namespace and seeds
//! - [`Keypair`] - ed25519 signing identities
//! - [`Lamports`] and [`FeeRate`] - integer amounts and basis-point fees
//! - [`accounts`] - the Marketplace, `UserAccount`, Listing, Purchase and Review records

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod address;
pub mod amount;
pub mod error;
pub mod fee;
pub mod keypair;

pub use accounts::{
    Category, Condition, FieldLimits, Listing, Marketplace, Purchase, Review, UserAccount,
};
pub use address::{Address, derive, find_address};
pub use amount::{LAMPORTS_PER_SOL, Lamports};
pub use error::CoreError;
pub use fee::{FeeRate, FeeSplit};
pub use keypair::{Keypair, Signature};
