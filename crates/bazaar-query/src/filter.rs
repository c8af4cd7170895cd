//! Listing predicates.
//!
//! Every set field of a [`ListingFilter`] must match for a listing to pass.
//! Unset fields, and empty search or location strings, match everything.
//! Results are ordered newest first; listings created at the same instant keep
//! their input order.

use std::collections::HashMap;

use bazaar_core::{Address, Category, Condition, Lamports, Listing, UserAccount};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Seller facts a filter may need but listings do not carry.
pub trait SellerDirectory {
    /// True if `seller` has a verified user account.
    fn is_verified(&self, seller: &Address) -> bool;

    /// The profile location text of `seller`, if known.
    fn location(&self, seller: &Address) -> Option<&str>;
}

/// User accounts keyed by authority identity.
impl SellerDirectory for HashMap<Address, UserAccount> {
    fn is_verified(&self, seller: &Address) -> bool {
        self.get(seller).is_some_and(|user| user.is_verified)
    }

    fn location(&self, seller: &Address) -> Option<&str> {
        self.get(seller).map(|user| user.location.as_str())
    }
}

/// A directory that knows no sellers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl SellerDirectory for NoDirectory {
    fn is_verified(&self, _seller: &Address) -> bool {
        false
    }

    fn location(&self, _seller: &Address) -> Option<&str> {
        None
    }
}

/// Conjunctive listing predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilter {
    /// Exact category.
    pub category: Option<Category>,
    /// Exact condition.
    pub condition: Option<Condition>,
    /// Inclusive lower price bound.
    pub min_price: Option<Lamports>,
    /// Inclusive upper price bound.
    pub max_price: Option<Lamports>,
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
    /// Only listings whose seller is verified.
    pub seller_verified: bool,
    /// Case-insensitive substring of the seller's profile location.
    pub location: Option<String>,
    /// Exact seller identity.
    pub seller: Option<Address>,
    /// Only listings that can still be bought.
    pub active_only: bool,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(|s| s.to_lowercase())
}

impl ListingFilter {
    /// A filter that matches every listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.condition.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && non_empty(self.search.as_ref()).is_none()
            && !self.seller_verified
            && non_empty(self.location.as_ref()).is_none()
            && self.seller.is_none()
            && !self.active_only
    }

    /// Checks that the filter can match anything at all.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidPriceRange` if `min_price > max_price`.
    pub fn validate(&self) -> Result<(), QueryError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(QueryError::InvalidPriceRange { min, max });
            }
        }
        Ok(())
    }

    /// Tests one listing against every set predicate.
    pub fn matches<D: SellerDirectory + ?Sized>(&self, listing: &Listing, directory: &D) -> bool {
        self.matcher().matches(listing, directory)
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher {
            filter: self,
            search: non_empty(self.search.as_ref()),
            location: non_empty(self.location.as_ref()),
        }
    }
}

/// A filter with its text predicates lowercased once.
struct Matcher<'a> {
    filter: &'a ListingFilter,
    search: Option<String>,
    location: Option<String>,
}

impl Matcher<'_> {
    fn matches<D: SellerDirectory + ?Sized>(&self, listing: &Listing, directory: &D) -> bool {
        let f = self.filter;
        if f.category.is_some_and(|c| c != listing.category)
            || f.condition.is_some_and(|c| c != listing.condition)
            || f.min_price.is_some_and(|min| listing.price < min)
            || f.max_price.is_some_and(|max| listing.price > max)
            || f.seller.is_some_and(|seller| seller != listing.seller)
            || (f.active_only && !listing.is_purchasable())
        {
            return false;
        }
        if let Some(term) = &self.search {
            if !listing.title.to_lowercase().contains(term.as_str())
                && !listing.description.to_lowercase().contains(term.as_str())
            {
                return false;
            }
        }
        if f.seller_verified && !directory.is_verified(&listing.seller) {
            return false;
        }
        if let Some(term) = &self.location {
            let Some(location) = directory.location(&listing.seller) else {
                return false;
            };
            if !location.to_lowercase().contains(term.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Returns the listings matching `filter`, newest first.
///
/// Pure: `listings` is not modified and the same inputs always give the same
/// output. Ties on `created_at` keep their relative input order.
#[must_use]
pub fn apply_filter<D: SellerDirectory + ?Sized>(
    listings: &[Listing],
    filter: &ListingFilter,
    directory: &D,
) -> Vec<Listing> {
    let matcher = filter.matcher();
    let mut matched: Vec<Listing> = listings
        .iter()
        .filter(|listing| matcher.matches(listing, directory))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matched
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_case::test_case;

    pub(crate) fn seller(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    pub(crate) fn listing(
        title: &str,
        category: Category,
        price: u64,
        created_at: i64,
        seller_byte: u8,
    ) -> Listing {
        Listing {
            address: bazaar_core::address::listing_address(&seller(seller_byte), title).0,
            seller: seller(seller_byte),
            buyer: None,
            title: title.to_string(),
            description: format!("{title} in great shape"),
            category,
            price: Lamports::new(price),
            condition: Condition::Good,
            images_uri: String::new(),
            metadata_uri: String::new(),
            is_active: true,
            is_sold: false,
            created_at,
            bump: 255,
        }
    }

    fn user(byte: u8, location: &str, verified: bool) -> UserAccount {
        UserAccount {
            address: bazaar_core::address::user_address(&seller(byte)).0,
            authority: seller(byte),
            display_name: format!("user {byte}"),
            bio: String::new(),
            location: location.to_string(),
            reputation_score: 0,
            total_reviews: 0,
            total_sales: 0,
            total_purchases: 0,
            is_verified: verified,
            verification_attestation: None,
            created_at: 0,
            bump: 255,
        }
    }

    fn directory() -> HashMap<Address, UserAccount> {
        [user(1, "Amsterdam, NL", true), user(2, "Berlin, DE", false)]
            .into_iter()
            .map(|u| (u.authority, u))
            .collect()
    }

    fn catalog() -> Vec<Listing> {
        vec![
            listing("MacBook Pro M2", Category::Electronics, 2_500_000_000, 10, 1),
            listing("Denim Jacket", Category::Clothing, 40_000_000, 30, 2),
            listing("iPhone 13", Category::Electronics, 600_000_000, 20, 2),
        ]
    }

    fn titles(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.title.as_str()).collect()
    }

    #[test]
    fn empty_filter_sorts_newest_first() {
        let result = apply_filter(&catalog(), &ListingFilter::new(), &NoDirectory);
        assert_eq!(titles(&result), vec!["Denim Jacket", "iPhone 13", "MacBook Pro M2"]);
    }

    #[test]
    fn category_and_search_compose() {
        let filter = ListingFilter {
            category: Some(Category::Electronics),
            search: Some("macbook".to_string()),
            ..ListingFilter::default()
        };
        let result = apply_filter(&catalog(), &filter, &NoDirectory);
        assert_eq!(titles(&result), vec!["MacBook Pro M2"]);
    }

    #[test]
    fn absent_category_returns_empty() {
        let listings = vec![listing("MacBook Pro M2", Category::Electronics, 1, 0, 1)];
        let filter = ListingFilter {
            category: Some(Category::Clothing),
            ..ListingFilter::default()
        };
        assert!(apply_filter(&listings, &filter, &NoDirectory).is_empty());
    }

    #[test_case(Some(600_000_000), None, &["iPhone 13", "MacBook Pro M2"] ; "min inclusive")]
    #[test_case(None, Some(600_000_000), &["Denim Jacket", "iPhone 13"] ; "max inclusive")]
    #[test_case(Some(600_000_000), Some(600_000_000), &["iPhone 13"] ; "exact")]
    fn price_range(min: Option<u64>, max: Option<u64>, expected: &[&str]) {
        let filter = ListingFilter {
            min_price: min.map(Lamports::new),
            max_price: max.map(Lamports::new),
            ..ListingFilter::default()
        };
        assert_eq!(titles(&apply_filter(&catalog(), &filter, &NoDirectory)), expected);
    }

    #[test_case("JACKET" ; "title uppercase")]
    #[test_case("great shape" ; "description")]
    fn search_is_case_insensitive_over_title_and_description(term: &str) {
        let filter = ListingFilter {
            search: Some(term.to_string()),
            category: Some(Category::Clothing),
            ..ListingFilter::default()
        };
        assert_eq!(apply_filter(&catalog(), &filter, &NoDirectory).len(), 1);
    }

    #[test]
    fn empty_search_is_ignored() {
        let filter = ListingFilter {
            search: Some(String::new()),
            location: Some(String::new()),
            ..ListingFilter::default()
        };
        assert!(filter.is_empty());
        assert_eq!(apply_filter(&catalog(), &filter, &NoDirectory).len(), 3);
    }

    #[test]
    fn verified_sellers_need_directory() {
        let filter = ListingFilter {
            seller_verified: true,
            ..ListingFilter::default()
        };
        assert_eq!(titles(&apply_filter(&catalog(), &filter, &directory())), vec!["MacBook Pro M2"]);
        assert!(apply_filter(&catalog(), &filter, &NoDirectory).is_empty());
    }

    #[test]
    fn location_matches_profile_text_not_address() {
        let filter = ListingFilter {
            location: Some("berlin".to_string()),
            ..ListingFilter::default()
        };
        assert_eq!(
            titles(&apply_filter(&catalog(), &filter, &directory())),
            vec!["Denim Jacket", "iPhone 13"]
        );

        let by_address = ListingFilter {
            location: Some(seller(1).to_base58()[..6].to_lowercase()),
            ..ListingFilter::default()
        };
        assert!(apply_filter(&catalog(), &by_address, &directory()).is_empty());
    }

    #[test]
    fn seller_matches_exact_identity() {
        let filter = ListingFilter {
            seller: Some(seller(2)),
            ..ListingFilter::default()
        };
        assert_eq!(
            titles(&apply_filter(&catalog(), &filter, &NoDirectory)),
            vec!["Denim Jacket", "iPhone 13"]
        );
    }

    #[test]
    fn active_only_hides_sold_listings() {
        let mut listings = catalog();
        listings[0].is_sold = true;
        listings[0].is_active = false;
        let filter = ListingFilter {
            active_only: true,
            ..ListingFilter::default()
        };
        assert_eq!(apply_filter(&listings, &filter, &NoDirectory).len(), 2);
        assert_eq!(apply_filter(&listings, &ListingFilter::new(), &NoDirectory).len(), 3);
    }

    #[test]
    fn inverted_price_range_is_invalid() {
        let filter = ListingFilter {
            min_price: Some(Lamports::new(10)),
            max_price: Some(Lamports::new(5)),
            ..ListingFilter::default()
        };
        assert_eq!(
            filter.validate(),
            Err(QueryError::InvalidPriceRange {
                min: Lamports::new(10),
                max: Lamports::new(5),
            })
        );
    }

    #[test]
    fn filter_deserializes_partially() {
        let filter: ListingFilter =
            serde_json::from_str(r#"{"category":"Books","active_only":true}"#).expect("deserialize");
        assert_eq!(filter.category, Some(Category::Books));
        assert!(filter.active_only);
        assert!(filter.search.is_none());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_listings() -> impl Strategy<Value = Vec<Listing>> {
            proptest::collection::vec((0usize..10, 1u64..1_000, 0i64..20, 1u8..4), 0..30).prop_map(
                |rows| {
                    rows.into_iter()
                        .enumerate()
                        .map(|(n, (cat, price, created, seller))| {
                            listing(&format!("item {n}"), Category::ALL[cat], price, created, seller)
                        })
                        .collect()
                },
            )
        }

        proptest! {
            #[test]
            fn category_filter_is_exact(listings in arb_listings(), cat in 0usize..10) {
                let category = Category::ALL[cat];
                let filter = ListingFilter { category: Some(category), ..ListingFilter::default() };
                let result = apply_filter(&listings, &filter, &NoDirectory);
                let expected = listings.iter().filter(|l| l.category == category).count();
                prop_assert_eq!(result.len(), expected);
                prop_assert!(result.iter().all(|l| l.category == category));
            }

            #[test]
            fn composed_filter_is_intersection(listings in arb_listings(), cat in 0usize..10, max in 1u64..1_000) {
                let by_category = ListingFilter { category: Some(Category::ALL[cat]), ..ListingFilter::default() };
                let by_price = ListingFilter { max_price: Some(Lamports::new(max)), ..ListingFilter::default() };
                let both = ListingFilter { category: by_category.category, max_price: by_price.max_price, ..ListingFilter::default() };

                let result = apply_filter(&listings, &both, &NoDirectory);
                let a = apply_filter(&listings, &by_category, &NoDirectory);
                let expected: Vec<Listing> = a.into_iter().filter(|l| by_price.matches(l, &NoDirectory)).collect();
                prop_assert_eq!(result, expected);
            }

            #[test]
            fn output_is_sorted_and_stable(listings in arb_listings()) {
                let result = apply_filter(&listings, &ListingFilter::new(), &NoDirectory);
                for pair in result.windows(2) {
                    prop_assert!(pair[0].created_at >= pair[1].created_at);
                    if pair[0].created_at == pair[1].created_at {
                        let pos = |l: &Listing| listings.iter().position(|x| x.address == l.address);
                        prop_assert!(pos(&pair[0]) < pos(&pair[1]));
                    }
                }
            }

            #[test]
            fn filtering_is_idempotent(listings in arb_listings(), max in 1u64..1_000) {
                let filter = ListingFilter { max_price: Some(Lamports::new(max)), ..ListingFilter::default() };
                let once = apply_filter(&listings, &filter, &NoDirectory);
                let twice = apply_filter(&once, &filter, &NoDirectory);
                prop_assert_eq!(&once, &twice);
                prop_assert_eq!(once, apply_filter(&listings, &filter, &NoDirectory));
            }
        }
    }
}
