//! Error types for bazaar-query.

use bazaar_core::{CoreError, Lamports};
use thiserror::Error;

/// Errors that can occur when building a listing query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Minimum price above maximum price.
    #[error("invalid price range: min {min} exceeds max {max}")]
    InvalidPriceRange {
        /// Requested minimum.
        min: Lamports,
        /// Requested maximum.
        max: Lamports,
    },

    /// A filter value could not be parsed.
    #[error(transparent)]
    Parse(#[from] CoreError),
}
