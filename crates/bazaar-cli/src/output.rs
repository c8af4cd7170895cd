//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use bazaar_core::{Address, Listing, Marketplace};
use bazaar_ledger::ErrorClass;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A derived account address.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedAddress {
    /// Namespace used.
    pub namespace: String,
    /// Resulting address.
    pub address: Address,
    /// Derivation nonce.
    pub bump: u8,
}

impl TableDisplay for DerivedAddress {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Namespace:  {}", self.namespace)?;
        writeln!(writer, "Address:    {}", self.address)?;
        writeln!(writer, "Bump:       {}", self.bump)?;
        Ok(())
    }
}

/// Result of one replayed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Zero-based step number.
    pub step: usize,
    /// Actor name.
    pub actor: String,
    /// Instruction kind.
    pub instruction: String,
    /// Account created or modified, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Address>,
    /// Error class, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ErrorClass>,
    /// Error message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    /// True if the step was applied.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Per-step outcomes, in order.
    pub steps: Vec<StepOutcome>,
    /// Final marketplace counters.
    pub marketplace: Option<Marketplace>,
}

impl ReplayReport {
    /// Number of rejected steps.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_ok()).count()
    }
}

impl TableDisplay for ReplayReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "{:>4}  {:<12}  {:<22}  {:<6}  DETAIL",
            "STEP", "ACTOR", "INSTRUCTION", "RESULT"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;
        for step in &self.steps {
            let (result, detail) = match (&step.account, &step.error) {
                (_, Some(error)) => ("FAIL", error.clone()),
                (Some(account), None) => ("ok", account.to_string()),
                (None, None) => ("ok", String::new()),
            };
            writeln!(
                writer,
                "{:>4}  {:<12}  {:<22}  {:<6}  {}",
                step.step,
                truncate(&step.actor, 12),
                step.instruction,
                result,
                detail
            )?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "{} step(s), {} rejected",
            self.steps.len(),
            self.failures()
        )?;
        if let Some(m) = &self.marketplace {
            writeln!(writer)?;
            writeln!(writer, "Marketplace {}", m.address)?;
            writeln!(writer, "  Fee rate:   {}", m.fee_rate)?;
            writeln!(writer, "  Users:      {}", m.total_users)?;
            writeln!(writer, "  Listings:   {}", m.total_listings)?;
            writeln!(writer, "  Volume:     {}", m.total_volume)?;
        }
        Ok(())
    }
}

/// Listings returned by a query.
#[derive(Debug, Clone, Serialize)]
pub struct ListingTable {
    /// Matching listings, newest first.
    pub listings: Vec<Listing>,
}

impl TableDisplay for ListingTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.listings.is_empty() {
            writeln!(writer, "No matching listings")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<28}  {:<12}  {:<8}  {:>20}  {:<6}  {:<44}",
            "TITLE", "CATEGORY", "COND", "PRICE", "STATUS", "SELLER"
        )?;
        writeln!(writer, "{}", "─".repeat(130))?;
        for listing in &self.listings {
            let status = if listing.is_sold {
                "sold"
            } else if listing.is_active {
                "active"
            } else {
                "closed"
            };
            writeln!(
                writer,
                "{:<28}  {:<12}  {:<8}  {:>20}  {:<6}  {:<44}",
                truncate(&listing.title, 28),
                listing.category,
                listing.condition,
                listing.price.to_string(),
                status,
                listing.seller
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} listing(s)", self.listings.len())?;
        Ok(())
    }
}

/// Shortens `s` to at most `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
