//! Incremental reputation scoring.
//!
//! A subject's score is an exponential moving average of its ratings mapped
//! onto `0..=500` (`rating * 100`). The first rating sets the score outright;
//! every later one moves it by the smoothing weight (10% by default), so a
//! single transaction cannot swing an established reputation far.
//!
//! All arithmetic is integer fixed-point with half-up rounding, which matches
//! rounding the real-valued formula:
//!
//! ```text
//! score     = round(old * (1 - w) + rating * 100 * w)
//! positives = round(old_positive / 100 * old_total) + [successful && rating >= threshold]
//! positive  = round(positives / (old_total + 1) * 100)
//! ```
//!
//! # Examples
//!
//! ```
//! use bazaar_core::{Address, Lamports};
//! use bazaar_reputation::{ReputationEngine, TransactionOutcome};
//!
//! let mut engine = ReputationEngine::default();
//! let alice = Address::new([1; 32]);
//!
//! let first = engine
//!     .update(alice, &TransactionOutcome::new(5, Lamports::new(100), true, true), 0)
//!     .unwrap();
//! assert_eq!(first.score, 500);
//!
//! let second = engine
//!     .update(alice, &TransactionOutcome::new(3, Lamports::new(100), true, false), 1)
//!     .unwrap();
//! assert_eq!(second.score, 480);
//! assert_eq!(second.positive_rating, 50);
//! ```

use bazaar_core::accounts::MAX_REPUTATION_SCORE;
use bazaar_core::{Address, Lamports};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attestation::AttestationLog;
use crate::config::ReputationConfig;
use crate::error::ReputationError;

const BPS: u128 = 10_000;

/// Aggregate reputation of one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationData {
    /// Smoothed score in `0..=500`.
    pub score: u16,
    /// Rated transactions folded in so far.
    pub total_transactions: u64,
    /// Percentage (`0..=100`) of transactions that were positive.
    pub positive_rating: u8,
    /// Successful transactions where the subject was the seller.
    pub verified_sales: u64,
    /// Account age carried forward from the first record.
    pub account_age: u64,
}

/// One rated transaction to fold into a subject's reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    /// Stars, `1..=5`.
    pub rating: u8,
    /// Value of the transaction.
    pub transaction_value: Lamports,
    /// Whether the transaction settled without dispute.
    pub is_successful: bool,
    /// Whether the subject was the seller.
    pub is_seller: bool,
}

impl TransactionOutcome {
    /// Creates an outcome.
    #[must_use]
    pub const fn new(
        rating: u8,
        transaction_value: Lamports,
        is_successful: bool,
        is_seller: bool,
    ) -> Self {
        Self {
            rating,
            transaction_value,
            is_successful,
            is_seller,
        }
    }
}

/// Folds transaction outcomes into per-subject reputation records.
///
/// The current reputation of a subject is always its latest attestation; the
/// engine keeps no other state.
#[derive(Debug, Clone, Default)]
pub struct ReputationEngine {
    config: ReputationConfig,
    issuer: Address,
    log: AttestationLog,
}

impl ReputationEngine {
    /// Creates an engine issuing attestations as `issuer`.
    #[must_use]
    pub fn new(config: ReputationConfig, issuer: Address) -> Self {
        Self::with_log(config, issuer, AttestationLog::new())
    }

    /// Creates an engine continuing from an existing log.
    #[must_use]
    pub fn with_log(config: ReputationConfig, issuer: Address, log: AttestationLog) -> Self {
        Self { config, issuer, log }
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &ReputationConfig {
        &self.config
    }

    /// The attestation log.
    #[must_use]
    pub const fn log(&self) -> &AttestationLog {
        &self.log
    }

    /// Current reputation of `subject`, if it has ever been rated.
    #[must_use]
    pub fn get(&self, subject: &Address) -> Option<ReputationData> {
        self.log.latest(subject).map(|record| record.data)
    }

    /// Computes the reputation that `outcome` would produce, without recording it.
    ///
    /// # Errors
    ///
    /// Returns `ReputationError::InvalidRating` outside `1..=5` and
    /// `ReputationError::Overflow` if a counter would wrap.
    pub fn preview(
        &self,
        subject: &Address,
        outcome: &TransactionOutcome,
    ) -> Result<ReputationData, ReputationError> {
        if !(1..=5).contains(&outcome.rating) {
            return Err(ReputationError::InvalidRating(outcome.rating));
        }
        let positive = outcome.is_successful && outcome.rating >= self.config.positive_threshold;
        let sale = u64::from(outcome.is_seller && outcome.is_successful);
        let rating_score = u128::from(outcome.rating) * 100;

        let Some(current) = self.get(subject) else {
            return Ok(ReputationData {
                score: rating_score as u16,
                total_transactions: 1,
                positive_rating: if positive { 100 } else { 0 },
                verified_sales: sale,
                account_age: 0,
            });
        };

        let weight = u128::from(self.config.smoothing_bps);
        let weighted = u128::from(current.score) * (BPS - weight) + rating_score * weight;
        let score = ((weighted + BPS / 2) / BPS).min(u128::from(MAX_REPUTATION_SCORE)) as u16;

        let old_total = u128::from(current.total_transactions);
        let positives =
            (u128::from(current.positive_rating) * old_total + 50) / 100 + u128::from(positive);
        let new_total = old_total + 1;
        let positive_rating = ((positives * 200 + new_total) / (new_total * 2)).min(100) as u8;

        let total_transactions = current
            .total_transactions
            .checked_add(1)
            .ok_or(ReputationError::Overflow)?;
        let verified_sales = current
            .verified_sales
            .checked_add(sale)
            .ok_or(ReputationError::Overflow)?;

        Ok(ReputationData {
            score,
            total_transactions,
            positive_rating,
            verified_sales,
            account_age: current.account_age,
        })
    }

    /// Folds `outcome` into `subject`'s reputation and records a new attestation.
    ///
    /// # Errors
    ///
    /// Same as [`ReputationEngine::preview`]; nothing is recorded on error.
    pub fn update(
        &mut self,
        subject: Address,
        outcome: &TransactionOutcome,
        now: i64,
    ) -> Result<ReputationData, ReputationError> {
        let data = self.preview(&subject, outcome)?;
        let record = self.log.append(subject, self.issuer, data, now);
        debug!(
            subject = %subject,
            sequence = record.sequence,
            score = data.score,
            positive_rating = data.positive_rating,
            "reputation updated"
        );
        Ok(data)
    }
}
