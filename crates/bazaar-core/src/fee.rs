//! Marketplace fee rates in basis points.
//!
//! The fee on a sale is `floor(price * rate / 10000)`, computed with `u128`
//! intermediates so no `u64` price can overflow. The seller receives the rest,
//! so `fee + seller_proceeds == price` always holds and `fee <= price`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Lamports};

/// Basis points in 100%.
pub const BASIS_POINTS: u16 = 10_000;

/// A fee rate in basis points (0..=10000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct FeeRate(u16);

/// The division of a sale price between marketplace and seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Amount routed to the marketplace treasury.
    pub fee: Lamports,
    /// Amount routed to the seller.
    pub seller_proceeds: Lamports,
}

impl FeeRate {
    /// No fee.
    pub const ZERO: Self = Self(0);

    /// Creates a fee rate.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidFeeRate` above 10000 basis points.
    pub fn new(bps: u16) -> Result<Self, CoreError> {
        if bps > BASIS_POINTS {
            return Err(CoreError::InvalidFeeRate(bps));
        }
        Ok(Self(bps))
    }

    /// Returns the rate in basis points.
    #[must_use]
    pub const fn bps(self) -> u16 {
        self.0
    }

    /// Splits `price` into the marketplace fee and the seller's proceeds.
    #[must_use]
    pub const fn split(self, price: Lamports) -> FeeSplit {
        let fee = (price.get() as u128 * self.0 as u128 / BASIS_POINTS as u128) as u64;
        FeeSplit {
            fee: Lamports::new(fee),
            seller_proceeds: Lamports::new(price.get() - fee),
        }
    }
}

impl TryFrom<u16> for FeeRate {
    type Error = CoreError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeRate> for u16 {
    fn from(rate: FeeRate) -> Self {
        rate.0
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
