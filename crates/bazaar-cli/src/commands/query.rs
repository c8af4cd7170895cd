//! Listing query command.

use std::io::Write;

use bazaar_ledger::LedgerSnapshot;
use bazaar_query::{FilterUpdate, MarketplaceState};
use tracing::debug;

use crate::cli::QueryArgs;
use crate::error::CliError;
use crate::output::{ListingTable, OutputFormat};

impl From<&QueryArgs> for FilterUpdate {
    fn from(args: &QueryArgs) -> Self {
        Self {
            category: args.category.map(Some),
            condition: args.condition.map(Some),
            min_price: args.min_price.map(Some),
            max_price: args.max_price.map(Some),
            search: args.search.clone().map(Some),
            seller_verified: args.verified.then_some(true),
            location: args.location.clone().map(Some),
            seller: args.seller.map(Some),
            active_only: args.active.then_some(true),
        }
    }
}

/// Query command executor.
#[derive(Debug, Default)]
pub struct QueryCommand;

impl QueryCommand {
    /// Create a new query command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Filters the listings of `snapshot`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter is invalid.
    pub fn run(&self, snapshot: LedgerSnapshot, args: &QueryArgs) -> Result<ListingTable, CliError> {
        let mut state = MarketplaceState::new();
        state.set_sellers(snapshot.users);
        state.set_listings(snapshot.listings);
        state.set_filter(FilterUpdate::from(args))?;
        debug!(
            total = state.listings().len(),
            matched = state.filtered().len(),
            "query evaluated"
        );
        Ok(ListingTable {
            listings: state.filtered().to_vec(),
        })
    }

    /// Loads the snapshot named in `args`, filters it and writes the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded, the filter is
    /// invalid, or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &QueryArgs,
    ) -> Result<ListingTable, CliError> {
        let snapshot = LedgerSnapshot::load(&args.snapshot)?;
        let table = self.run(snapshot, args)?;
        format.write(writer, &table)?;
        Ok(table)
    }
}
