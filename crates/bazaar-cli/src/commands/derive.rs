//! Address derivation command.

use std::io::Write;

use bazaar_core::{Address, find_address};

use crate::cli::DeriveArgs;
use crate::error::CliError;
use crate::output::{DerivedAddress, OutputFormat};

/// Prefix marking a seed part as raw UTF-8 text.
pub const TEXT_PREFIX: &str = "text:";

/// Decodes one seed part: `text:<utf-8>` or a base58 address.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` if the part is neither.
pub fn parse_part(part: &str) -> Result<Vec<u8>, CliError> {
    if let Some(text) = part.strip_prefix(TEXT_PREFIX) {
        return Ok(text.as_bytes().to_vec());
    }
    part.parse::<Address>()
        .map(|address| address.as_bytes().to_vec())
        .map_err(|e| CliError::InvalidArgument(format!("{e} (use {TEXT_PREFIX} for plain text)")))
}

/// Derive command executor.
#[derive(Debug, Default)]
pub struct DeriveCommand;

impl DeriveCommand {
    /// Create a new derive command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Derives the address and writes it.
    ///
    /// # Errors
    ///
    /// Returns an error if a part cannot be decoded or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &DeriveArgs,
    ) -> Result<DerivedAddress, CliError> {
        let parts = args
            .parts
            .iter()
            .map(|p| parse_part(p))
            .collect::<Result<Vec<_>, _>>()?;
        let seeds: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        let (address, bump) = find_address(&args.namespace, &seeds);

        let derived = DerivedAddress {
            namespace: args.namespace.clone(),
            address,
            bump,
        };
        format.write(writer, &derived)?;
        Ok(derived)
    }
}
