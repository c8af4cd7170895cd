//! In-memory account store.

use std::collections::BTreeMap;

use bazaar_core::accounts::MAX_REPUTATION_SCORE;
use bazaar_core::address::{
    listing_address, marketplace_address, purchase_address, review_address, user_address,
};
use bazaar_core::{Address, Lamports, Listing, Marketplace, Purchase, Review, UserAccount};
use bazaar_reputation::{ReputationConfig, ReputationEngine};

use crate::error::{AccountKind, LedgerError};
use crate::snapshot::LedgerSnapshot;

/// All ledger accounts, keyed by derived address.
#[derive(Debug, Clone)]
pub(crate) struct LedgerState {
    pub(crate) marketplace: Option<Marketplace>,
    pub(crate) users: BTreeMap<Address, UserAccount>,
    pub(crate) listings: BTreeMap<Address, Listing>,
    pub(crate) purchases: BTreeMap<Address, Purchase>,
    pub(crate) reviews: BTreeMap<Address, Review>,
    pub(crate) reputation: ReputationEngine,
}

impl LedgerState {
    pub(crate) fn new(reputation: ReputationConfig) -> Self {
        Self {
            marketplace: None,
            users: BTreeMap::new(),
            listings: BTreeMap::new(),
            purchases: BTreeMap::new(),
            reviews: BTreeMap::new(),
            reputation: ReputationEngine::new(reputation, marketplace_address().0),
        }
    }

    pub(crate) fn marketplace(&self) -> Result<&Marketplace, LedgerError> {
        self.marketplace
            .as_ref()
            .ok_or_else(|| LedgerError::not_found(AccountKind::Marketplace, marketplace_address().0))
    }

    pub(crate) fn user(&self, address: &Address) -> Result<&UserAccount, LedgerError> {
        self.users
            .get(address)
            .ok_or(LedgerError::not_found(AccountKind::User, *address))
    }

    pub(crate) fn listing(&self, address: &Address) -> Result<&Listing, LedgerError> {
        self.listings
            .get(address)
            .ok_or(LedgerError::not_found(AccountKind::Listing, *address))
    }

    pub(crate) fn purchase(&self, address: &Address) -> Result<&Purchase, LedgerError> {
        self.purchases
            .get(address)
            .ok_or(LedgerError::not_found(AccountKind::Purchase, *address))
    }

    /// Mutable access to an account already checked to exist.
    pub(crate) fn user_mut(&mut self, address: &Address) -> Result<&mut UserAccount, LedgerError> {
        self.users
            .get_mut(address)
            .ok_or(LedgerError::not_found(AccountKind::User, *address))
    }

    pub(crate) fn to_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            marketplace: self.marketplace.clone(),
            users: self.users.values().cloned().collect(),
            listings: self.listings.values().cloned().collect(),
            purchases: self.purchases.values().cloned().collect(),
            reviews: self.reviews.values().cloned().collect(),
            attestations: self.reputation.log().clone(),
        }
    }

    /// Rebuilds the store from a snapshot after checking that its accounts
    /// agree with their derived addresses and with each other.
    pub(crate) fn from_snapshot(
        snapshot: LedgerSnapshot,
        reputation: ReputationConfig,
    ) -> Result<Self, LedgerError> {
        check_snapshot(&snapshot)?;
        let state = Self {
            marketplace: snapshot.marketplace,
            users: keyed(snapshot.users, |a| a.address, AccountKind::User)?,
            listings: keyed(snapshot.listings, |a| a.address, AccountKind::Listing)?,
            purchases: keyed(snapshot.purchases, |a| a.address, AccountKind::Purchase)?,
            reviews: keyed(snapshot.reviews, |a| a.address, AccountKind::Review)?,
            reputation: ReputationEngine::with_log(
                reputation,
                marketplace_address().0,
                snapshot.attestations,
            ),
        };
        Ok(state)
    }
}

fn corrupt(message: String) -> LedgerError {
    LedgerError::CorruptSnapshot(message)
}

fn keyed<T>(
    accounts: Vec<T>,
    address: impl Fn(&T) -> Address,
    kind: AccountKind,
) -> Result<BTreeMap<Address, T>, LedgerError> {
    let mut map = BTreeMap::new();
    for account in accounts {
        let key = address(&account);
        if map.insert(key, account).is_some() {
            return Err(corrupt(format!("duplicate {kind} account {key}")));
        }
    }
    Ok(map)
}

fn check_derived(
    kind: AccountKind,
    stored: (Address, u8),
    derived: (Address, u8),
) -> Result<(), LedgerError> {
    if stored == derived {
        Ok(())
    } else {
        Err(corrupt(format!(
            "{kind} account {} does not match derived address {} (bump {})",
            stored.0, derived.0, derived.1
        )))
    }
}

fn check_snapshot(snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
    let Some(marketplace) = &snapshot.marketplace else {
        let accounts = snapshot.users.len()
            + snapshot.listings.len()
            + snapshot.purchases.len()
            + snapshot.reviews.len();
        if accounts > 0 {
            return Err(corrupt(format!("{accounts} accounts without a marketplace")));
        }
        return Ok(());
    };
    check_derived(
        AccountKind::Marketplace,
        (marketplace.address, marketplace.bump),
        marketplace_address(),
    )?;

    for user in &snapshot.users {
        check_derived(AccountKind::User, (user.address, user.bump), user_address(&user.authority))?;
        if user.reputation_score > MAX_REPUTATION_SCORE {
            return Err(corrupt(format!(
                "user {} reputation {} exceeds {MAX_REPUTATION_SCORE}",
                user.address, user.reputation_score
            )));
        }
    }

    for listing in &snapshot.listings {
        check_derived(
            AccountKind::Listing,
            (listing.address, listing.bump),
            listing_address(&listing.seller, &listing.title),
        )?;
        if listing.is_sold && (listing.is_active || listing.buyer.is_none()) {
            return Err(corrupt(format!(
                "sold listing {} must be inactive with a buyer",
                listing.address
            )));
        }
    }

    let mut volume = Lamports::ZERO;
    for purchase in &snapshot.purchases {
        check_derived(
            AccountKind::Purchase,
            (purchase.address, purchase.bump),
            purchase_address(&purchase.listing, &purchase.buyer),
        )?;
        volume = volume
            .checked_add(purchase.price)
            .ok_or_else(|| corrupt("purchase volume overflows".to_string()))?;
    }

    for review in &snapshot.reviews {
        check_derived(
            AccountKind::Review,
            (review.address, review.bump),
            review_address(&review.purchase, &review.reviewer),
        )?;
        if !snapshot.purchases.iter().any(|p| p.address == review.purchase) {
            return Err(corrupt(format!(
                "review {} references missing purchase {}",
                review.address, review.purchase
            )));
        }
    }

    let counts = [
        ("total_users", marketplace.total_users, snapshot.users.len()),
        ("total_listings", marketplace.total_listings, snapshot.listings.len()),
    ];
    for (counter, stored, records) in counts {
        if usize::try_from(stored).ok() != Some(records) {
            return Err(corrupt(format!("{counter} is {stored} but {records} accounts exist")));
        }
    }
    if marketplace.total_volume != volume {
        return Err(corrupt(format!(
            "total_volume is {} but purchases sum to {volume}",
            marketplace.total_volume
        )));
    }
    Ok(())
}
