//! Lamport amounts.
//!
//! All monetary values on the ledger are integers in lamports, the smallest
//! unit of the native asset. `1 SOL = 1_000_000_000` lamports. Arithmetic is
//! checked; callers decide what overflow means.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Number of decimal places of the native asset.
pub const DECIMALS: u32 = 9;

/// Lamports in one whole unit of the native asset.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// An amount of the native asset in lamports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lamports(u64);

impl Lamports {
    /// Zero lamports.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an amount from lamports.
    #[must_use]
    pub const fn new(lamports: u64) -> Self {
        Self(lamports)
    }

    /// Creates an amount from whole SOL, or `None` on overflow.
    #[must_use]
    pub const fn from_sol(sol: u64) -> Option<Self> {
        match sol.checked_mul(LAMPORTS_PER_SOL) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns the raw lamport count.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Lamports {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / LAMPORTS_PER_SOL;
        let frac = self.0 % LAMPORTS_PER_SOL;
        write!(f, "{whole}.{frac:09} SOL")
    }
}

/// Parses a decimal SOL amount such as `"2.5"` into lamports.
impl FromStr for Lamports {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches("SOL").trim();
        if s.starts_with('-') {
            return Err(CoreError::InvalidAmount("negative values not allowed".into()));
        }

        let (whole_str, frac_str) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let whole: u64 = if whole_str.is_empty() {
            0
        } else {
            whole_str
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid whole part: {s}")))?
        };

        if frac_str.len() > DECIMALS as usize {
            return Err(CoreError::InvalidAmount("too many decimal places".into()));
        }
        let frac: u64 = if frac_str.is_empty() {
            0
        } else {
            format!("{frac_str:0<9}")
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid fractional part: {s}")))?
        };

        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(|| CoreError::InvalidAmount("overflow".into()))
    }
}
