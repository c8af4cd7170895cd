//! Integration test crate for the Bazaar ledger.
//!
//! This crate exists solely to run tests that span the core, reputation,
//! ledger and query crates. It has no public API.

#![forbid(unsafe_code)]
