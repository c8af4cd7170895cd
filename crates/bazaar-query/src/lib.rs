//! # bazaar-query
//!
//! Listing discovery over read snapshots of the ledger.
//!
//! This crate provides:
//!
//! - [`ListingFilter`] and [`apply_filter`] - conjunctive predicates, newest first
//! - [`SellerDirectory`] - seller verification and location lookups
//! - [`MarketplaceState`] - application state that refilters on every change

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod state;

pub use error::QueryError;
pub use filter::{ListingFilter, NoDirectory, SellerDirectory, apply_filter};
pub use state::{FilterUpdate, MarketplaceState};
