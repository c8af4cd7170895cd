//! Ledger configuration.

use bazaar_core::FieldLimits;
use bazaar_reputation::ReputationConfig;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Tunables applied by the instruction processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum byte lengths of text fields.
    pub limits: FieldLimits,
    /// Reputation smoothing parameters.
    pub reputation: ReputationConfig,
}

impl LedgerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidConfig` if any length limit is zero or the
    /// reputation parameters are out of range.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let FieldLimits {
            display_name,
            bio,
            location,
            title,
            description,
            uri,
            comment,
            attestation,
        } = self.limits;
        let named = [
            ("display_name", display_name),
            ("bio", bio),
            ("location", location),
            ("title", title),
            ("description", description),
            ("uri", uri),
            ("comment", comment),
            ("attestation", attestation),
        ];
        if let Some((name, _)) = named.iter().find(|(_, max)| *max == 0) {
            return Err(LedgerError::InvalidConfig(format!(
                "limits.{name} must be greater than zero"
            )));
        }
        self.reputation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = LedgerConfig::default();
        config.limits.comment = 0;
        let err = config.validate().expect_err("zero limit");
        assert_eq!(
            err,
            LedgerError::InvalidConfig("limits.comment must be greater than zero".to_string())
        );
    }

    #[test]
    fn reputation_errors_surface() {
        let mut config = LedgerConfig::default();
        config.reputation.positive_threshold = 6;
        assert!(matches!(config.validate(), Err(LedgerError::InvalidConfig(_))));
    }
}
