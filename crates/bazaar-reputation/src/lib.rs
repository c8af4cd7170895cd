//! # bazaar-reputation
//!
//! Reputation scoring for marketplace participants.
//!
//! This crate provides:
//!
//! - [`ReputationEngine`] - folds each rated transaction into a subject's score
//! - [`AttestationLog`] - append-only, hash-chained history of reputation records
//! - [`ReputationConfig`] - smoothing weight and positive-rating threshold

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attestation;
pub mod config;
pub mod engine;
pub mod error;

pub use attestation::{AttestationLog, ReputationAttestation};
pub use config::ReputationConfig;
pub use engine::{ReputationData, ReputationEngine, TransactionOutcome};
pub use error::ReputationError;
