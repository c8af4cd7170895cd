//! Ledger account records.
//!
//! Five account kinds make up the marketplace ledger. Each one lives at a
//! derived [`Address`] (see [`crate::address`]) and stores that address and its
//! bump alongside its data. Counters are unsigned and only ever incremented.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Address, CoreError, FeeRate, Lamports};

/// Highest reputation score a user account can carry.
pub const MAX_REPUTATION_SCORE: u16 = 500;

/// Maximum byte lengths of user-supplied text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    /// User display name.
    pub display_name: usize,
    /// User bio.
    pub bio: usize,
    /// User location.
    pub location: usize,
    /// Listing title.
    pub title: usize,
    /// Listing description.
    pub description: usize,
    /// Image or metadata URI.
    pub uri: usize,
    /// Review comment.
    pub comment: usize,
    /// Verification attestation reference.
    pub attestation: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            display_name: 50,
            bio: 500,
            location: 100,
            title: 100,
            description: 2000,
            uri: 200,
            comment: 500,
            attestation: 200,
        }
    }
}

/// Listing category. Closed set; unknown names are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Category {
    /// Phones, computers, gadgets.
    Electronics,
    /// Apparel.
    Clothing,
    /// Home and garden.
    Home,
    /// Sporting goods.
    Sports,
    /// Books.
    Books,
    /// Vehicles and parts.
    Automotive,
    /// Art.
    Art,
    /// Instruments and records.
    Music,
    /// Games and consoles.
    Gaming,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Electronics,
        Self::Clothing,
        Self::Home,
        Self::Sports,
        Self::Books,
        Self::Automotive,
        Self::Art,
        Self::Music,
        Self::Gaming,
        Self::Other,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::Home => "Home",
            Self::Sports => "Sports",
            Self::Books => "Books",
            Self::Automotive => "Automotive",
            Self::Art => "Art",
            Self::Music => "Music",
            Self::Gaming => "Gaming",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for &'static str {
    fn from(value: Category) -> Self {
        value.as_str()
    }
}

/// Item condition. Closed set; unknown names are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Condition {
    /// Unused.
    New,
    /// Used, no visible wear.
    LikeNew,
    /// Light wear.
    Good,
    /// Noticeable wear.
    Fair,
    /// Heavy wear or defects.
    Poor,
}

impl Condition {
    /// Every condition, best first.
    pub const ALL: [Self; 5] = [Self::New, Self::LikeNew, Self::Good, Self::Fair, Self::Poor];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "LikeNew",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownCondition(s.to_string()))
    }
}

impl TryFrom<String> for Condition {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Condition> for &'static str {
    fn from(value: Condition) -> Self {
        value.as_str()
    }
}

/// Deployment-wide marketplace configuration and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketplace {
    /// Derived address.
    pub address: Address,
    /// Identity that initialized the marketplace.
    pub authority: Address,
    /// Fee charged on every sale.
    pub fee_rate: FeeRate,
    /// Listings ever created.
    pub total_listings: u64,
    /// User accounts ever created.
    pub total_users: u64,
    /// Sum of all purchase prices.
    pub total_volume: Lamports,
    /// Derivation nonce.
    pub bump: u8,
}

/// A participant profile, one per authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Derived address.
    pub address: Address,
    /// Owning identity.
    pub authority: Address,
    /// Public name.
    pub display_name: String,
    /// Free-form bio.
    pub bio: String,
    /// Free-form location text.
    pub location: String,
    /// Reputation score in `0..=500`.
    pub reputation_score: u16,
    /// Reviews received.
    pub total_reviews: u32,
    /// Listings sold.
    pub total_sales: u32,
    /// Listings bought.
    pub total_purchases: u32,
    /// Set once an identity attestation has been recorded.
    pub is_verified: bool,
    /// Opaque reference to the verifying attestation.
    pub verification_attestation: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Derivation nonce.
    pub bump: u8,
}

/// An item offered for sale, one per (seller, title).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Derived address.
    pub address: Address,
    /// Seller identity.
    pub seller: Address,
    /// Buyer identity, set by the purchase.
    pub buyer: Option<Address>,
    /// Title, also a derivation seed.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category.
    pub category: Category,
    /// Asking price, always positive.
    pub price: Lamports,
    /// Condition.
    pub condition: Condition,
    /// Storage URI of the images.
    pub images_uri: String,
    /// Storage URI of extra metadata.
    pub metadata_uri: String,
    /// Open for purchase.
    pub is_active: bool,
    /// Sold; terminal.
    pub is_sold: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Derivation nonce.
    pub bump: u8,
}

impl Listing {
    /// True if a purchase may be made against this listing right now.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_active && !self.is_sold
    }
}

/// A completed sale, one per (listing, buyer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Derived address.
    pub address: Address,
    /// Buyer identity.
    pub buyer: Address,
    /// Seller identity.
    pub seller: Address,
    /// Address of the purchased listing.
    pub listing: Address,
    /// Price paid.
    pub price: Lamports,
    /// Marketplace fee taken from the price.
    pub fee: Lamports,
    /// Unix timestamp of the purchase.
    pub purchased_at: i64,
    /// Unix timestamp of settlement.
    pub completed_at: Option<i64>,
    /// Settled by the buyer.
    pub is_completed: bool,
    /// Under dispute.
    pub is_disputed: bool,
    /// Derivation nonce.
    pub bump: u8,
}

/// A rating of one purchase party by the other, one per (purchase, reviewer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Derived address.
    pub address: Address,
    /// Author identity.
    pub reviewer: Address,
    /// Rated identity.
    pub reviewee: Address,
    /// Address of the reviewed purchase.
    pub purchase: Address,
    /// Stars, `1..=5`.
    pub rating: u8,
    /// Free-form comment.
    pub comment: String,
    /// True when the seller is the one being rated.
    pub is_seller_review: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Derivation nonce.
    pub bump: u8,
}
