//! Reputation engine configuration.

use serde::{Deserialize, Serialize};

use crate::ReputationError;

/// Tuning for the reputation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Weight of the newest rating in basis points (1000 = 10%).
    pub smoothing_bps: u16,
    /// Minimum rating that counts as positive for a successful transaction.
    pub positive_threshold: u8,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            smoothing_bps: 1_000,
            positive_threshold: 4,
        }
    }
}

impl ReputationConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the weight exceeds 10000 bps or the threshold is
    /// outside `1..=5`.
    pub fn validate(&self) -> Result<(), ReputationError> {
        if self.smoothing_bps > 10_000 {
            return Err(ReputationError::InvalidConfig(format!(
                "smoothing_bps must be at most 10000, got {}",
                self.smoothing_bps
            )));
        }
        if !(1..=5).contains(&self.positive_threshold) {
            return Err(ReputationError::InvalidConfig(format!(
                "positive_threshold must be 1-5, got {}",
                self.positive_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ReputationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let heavy = ReputationConfig {
            smoothing_bps: 10_001,
            ..ReputationConfig::default()
        };
        assert!(heavy.validate().is_err());

        let zero_threshold = ReputationConfig {
            positive_threshold: 0,
            ..ReputationConfig::default()
        };
        assert!(zero_threshold.validate().is_err());
    }
}
