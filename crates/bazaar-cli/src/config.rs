//! CLI configuration.
//!
//! Loaded from a TOML file with three optional sections:
//!
//! ```toml
//! [ledger]
//! initial_balance = 100_000_000_000
//!
//! [ledger.limits]
//! bio = 280
//!
//! [reputation]
//! smoothing_bps = 1000
//! positive_threshold = 4
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::Path;

use bazaar_core::{FieldLimits, LAMPORTS_PER_SOL, Lamports};
use bazaar_ledger::LedgerConfig;
use bazaar_reputation::ReputationConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Ledger settings used by `replay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Text field limits.
    pub limits: FieldLimits,
    /// Balance credited to every script actor before the first step.
    pub initial_balance: Lamports,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            limits: FieldLimits::default(),
            initial_balance: Lamports::new(100 * LAMPORTS_PER_SOL),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BazaarConfig {
    /// Ledger settings.
    pub ledger: LedgerSection,
    /// Reputation engine settings.
    pub reputation: ReputationConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl BazaarConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        toml::from_str(content).map_err(|e| CliError::Config(format!("invalid TOML: {e}")))
    }

    /// The ledger configuration these settings describe.
    #[must_use]
    pub const fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            limits: self.ledger.limits,
            reputation: self.reputation,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), CliError> {
        self.ledger_config()
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        if self.logging.level.trim().is_empty() {
            return Err(CliError::Config("logging.level cannot be empty".into()));
        }
        Ok(())
    }
}
