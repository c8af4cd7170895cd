//! Application state for a discovery client.
//!
//! [`MarketplaceState`] holds the listing snapshot, the current filter and the
//! filtered view. Every mutation recomputes the view with [`apply_filter`];
//! the snapshot itself is never reordered or modified by filtering.

use std::collections::HashMap;

use bazaar_core::{Address, Category, Condition, Lamports, Listing, UserAccount};
use tracing::debug;

use crate::error::QueryError;
use crate::filter::{ListingFilter, apply_filter};

/// A partial filter change. `None` keeps the current value; `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    /// Category predicate.
    pub category: Option<Option<Category>>,
    /// Condition predicate.
    pub condition: Option<Option<Condition>>,
    /// Lower price bound.
    pub min_price: Option<Option<Lamports>>,
    /// Upper price bound.
    pub max_price: Option<Option<Lamports>>,
    /// Search text.
    pub search: Option<Option<String>>,
    /// Verified-seller flag.
    pub seller_verified: Option<bool>,
    /// Location text.
    pub location: Option<Option<String>>,
    /// Seller identity.
    pub seller: Option<Option<Address>>,
    /// Active-only flag.
    pub active_only: Option<bool>,
}

impl FilterUpdate {
    fn merge_into(self, mut filter: ListingFilter) -> ListingFilter {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut filter.category, self.category);
        set(&mut filter.condition, self.condition);
        set(&mut filter.min_price, self.min_price);
        set(&mut filter.max_price, self.max_price);
        set(&mut filter.search, self.search);
        set(&mut filter.seller_verified, self.seller_verified);
        set(&mut filter.location, self.location);
        set(&mut filter.seller, self.seller);
        set(&mut filter.active_only, self.active_only);
        filter
    }
}

/// Listings, sellers and the current filtered view.
#[derive(Debug, Clone, Default)]
pub struct MarketplaceState {
    listings: Vec<Listing>,
    filtered: Vec<Listing>,
    filter: ListingFilter,
    sellers: HashMap<Address, UserAccount>,
    user_account: Option<UserAccount>,
    selected: Option<Address>,
}

impl MarketplaceState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn refilter(&mut self) {
        self.filtered = apply_filter(&self.listings, &self.filter, &self.sellers);
        debug!(
            total = self.listings.len(),
            matched = self.filtered.len(),
            "listings refiltered"
        );
    }

    /// Replaces the listing snapshot.
    pub fn set_listings(&mut self, listings: Vec<Listing>) {
        self.listings = listings;
        self.refilter();
    }

    /// Adds a listing at the front of the snapshot.
    pub fn add_listing(&mut self, listing: Listing) {
        self.listings.insert(0, listing);
        self.refilter();
    }

    /// Replaces the seller directory used by verification and location filters.
    pub fn set_sellers(&mut self, sellers: impl IntoIterator<Item = UserAccount>) {
        self.sellers = sellers.into_iter().map(|u| (u.authority, u)).collect();
        self.refilter();
    }

    /// Merges `update` into the current filter.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidPriceRange` if the merged filter has an
    /// inverted price range; the current filter is kept.
    pub fn set_filter(&mut self, update: FilterUpdate) -> Result<(), QueryError> {
        let merged = update.merge_into(self.filter.clone());
        merged.validate()?;
        self.filter = merged;
        self.refilter();
        Ok(())
    }

    /// Removes every predicate.
    pub fn clear_filter(&mut self) {
        self.filter = ListingFilter::default();
        self.refilter();
    }

    /// Sets the signed-in user's account.
    pub fn set_user_account(&mut self, account: Option<UserAccount>) {
        self.user_account = account;
    }

    /// The signed-in user's account.
    #[must_use]
    pub const fn user_account(&self) -> Option<&UserAccount> {
        self.user_account.as_ref()
    }

    /// Selects the listing at `address`, if it is in the snapshot.
    pub fn select_listing(&mut self, address: Option<Address>) -> Option<&Listing> {
        self.selected = address.filter(|a| self.listings.iter().any(|l| l.address == *a));
        self.selected_listing()
    }

    /// The selected listing.
    #[must_use]
    pub fn selected_listing(&self) -> Option<&Listing> {
        let selected = self.selected?;
        self.listings.iter().find(|l| l.address == selected)
    }

    /// The full snapshot, in insertion order.
    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Listings matching the current filter, newest first.
    #[must_use]
    pub fn filtered(&self) -> &[Listing] {
        &self.filtered
    }

    /// The current filter.
    #[must_use]
    pub const fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    /// Every listing in `category`, ignoring the current filter.
    #[must_use]
    pub fn listings_by_category(&self, category: Category) -> Vec<&Listing> {
        self.listings.iter().filter(|l| l.category == category).collect()
    }

    /// Every listing by `seller`, ignoring the current filter.
    #[must_use]
    pub fn listings_by_seller(&self, seller: &Address) -> Vec<&Listing> {
        self.listings.iter().filter(|l| l.seller == *seller).collect()
    }
}
