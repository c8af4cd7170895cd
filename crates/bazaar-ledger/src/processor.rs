//! The instruction processor.
//!
//! [`Ledger`] owns all account state behind one lock. Each instruction runs
//! to completion with the lock held: it reads and validates the accounts it
//! touches, computes every new counter with checked arithmetic, performs any
//! asset transfer, and only then writes. A failure at any step returns before
//! the first write, so a rejected instruction never leaves partial state.

use bazaar_core::address::{listing_address, marketplace_address, user_address};
use bazaar_core::{
    Address, Category, Condition, FeeRate, Lamports, Listing, Marketplace, Purchase, Review,
    UserAccount,
};
use bazaar_reputation::{ReputationAttestation, ReputationData};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{AccountKind, LedgerError};
use crate::instruction::{Instruction, Receipt, SignedInstruction};
use crate::review::NewReview;
use crate::snapshot::LedgerSnapshot;
use crate::state::LedgerState;
use crate::transfer::{AssetTransfer, InMemoryBank};

/// Fails with `err(len, max)` if `value` is longer than `max` bytes.
pub(crate) fn check_len(
    value: &str,
    max: usize,
    err: impl FnOnce(usize, usize) -> LedgerError,
) -> Result<(), LedgerError> {
    if value.len() > max {
        return Err(err(value.len(), max));
    }
    Ok(())
}

/// Fails with `Unauthorized` unless `signer` is `expected`.
pub(crate) fn require_signer(expected: &Address, signer: &Address) -> Result<(), LedgerError> {
    if expected != signer {
        return Err(LedgerError::Unauthorized {
            expected: *expected,
            actual: *signer,
        });
    }
    Ok(())
}

/// Outcome of a handler, turned into a [`Receipt`] by the dispatcher.
pub(crate) struct Applied {
    pub(crate) account: Address,
    pub(crate) fee: Option<bazaar_core::FeeSplit>,
    pub(crate) reputation: Option<ReputationData>,
}

impl Applied {
    pub(crate) const fn account(account: Address) -> Self {
        Self {
            account,
            fee: None,
            reputation: None,
        }
    }
}

/// The marketplace ledger.
#[derive(Debug)]
pub struct Ledger<B = InMemoryBank, C = SystemClock> {
    pub(crate) config: LedgerConfig,
    pub(crate) state: Mutex<LedgerState>,
    pub(crate) bank: B,
    pub(crate) clock: C,
}

impl<B: AssetTransfer, C: Clock> Ledger<B, C> {
    /// Creates an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidConfig` if `config` does not validate.
    pub fn new(config: LedgerConfig, bank: B, clock: C) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(LedgerState::new(config.reputation)),
            config,
            bank,
            clock,
        })
    }

    /// Recreates a ledger from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidConfig` if `config` does not validate, or
    /// `LedgerError::CorruptSnapshot` if the snapshot's accounts disagree with
    /// their derived addresses, the marketplace counters or each other.
    pub fn restore(
        config: LedgerConfig,
        bank: B,
        clock: C,
        snapshot: LedgerSnapshot,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(LedgerState::from_snapshot(snapshot, config.reputation)?),
            config,
            bank,
            clock,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The asset-transfer backend.
    pub const fn bank(&self) -> &B {
        &self.bank
    }

    /// The time source.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Verifies a signed instruction and executes it.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidSignature` if the signature does not match
    /// the claimed signer, otherwise whatever [`Ledger::execute`] returns.
    ///
    /// A resubmitted instruction is executed again; callers must deduplicate.
    pub fn submit(&self, signed: &SignedInstruction) -> Result<Receipt, LedgerError> {
        if let Err(e) = signed.verify() {
            debug!(signer = %signed.signer, instruction = signed.instruction.name(), "rejected unsigned instruction");
            return Err(e);
        }
        self.execute(&signed.signer, &signed.instruction)
    }

    /// Executes `instruction` as `signer`, atomically.
    ///
    /// The caller is responsible for having authenticated `signer`.
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition; the ledger is unchanged.
    pub fn execute(&self, signer: &Address, instruction: &Instruction) -> Result<Receipt, LedgerError> {
        let mut state = self.state.lock();
        let now = self.clock.now();

        let result = match instruction {
            Instruction::InitializeMarketplace { fee_rate } => {
                Self::initialize_marketplace(&mut state, signer, *fee_rate)
            }
            Instruction::CreateUserAccount {
                display_name,
                bio,
                location,
            } => self.create_user_account(&mut state, signer, display_name, bio, location, now),
            Instruction::UpdateProfile {
                user,
                display_name,
                bio,
                location,
            } => self.update_profile(
                &mut state,
                signer,
                user,
                display_name.as_deref(),
                bio.as_deref(),
                location.as_deref(),
            ),
            Instruction::UpdateVerification { user, attestation } => {
                self.update_verification(&mut state, signer, user, attestation)
            }
            Instruction::CreateListing {
                title,
                description,
                category,
                price,
                condition,
                images_uri,
                metadata_uri,
            } => self.create_listing(
                &mut state,
                signer,
                NewListing {
                    title,
                    description,
                    category: *category,
                    price: *price,
                    condition: *condition,
                    images_uri,
                    metadata_uri,
                },
                now,
            ),
            Instruction::UpdateListingStatus { listing, active } => {
                Self::update_listing_status(&mut state, signer, listing, *active)
            }
            Instruction::PurchaseItem { listing } => {
                self.purchase_item(&mut state, signer, listing, now)
            }
            Instruction::CompletePurchase { purchase } => {
                Self::complete_purchase(&mut state, signer, purchase, now)
            }
            Instruction::OpenDispute { purchase } => {
                Self::open_dispute(&mut state, signer, purchase)
            }
            Instruction::LeaveReview {
                purchase,
                rating,
                comment,
                is_seller_review,
            } => self.leave_review(
                &mut state,
                signer,
                NewReview {
                    purchase,
                    rating: *rating,
                    comment,
                    is_seller_review: *is_seller_review,
                },
                now,
            ),
        };

        match result {
            Ok(applied) => Ok(Receipt {
                instruction: instruction.name().to_string(),
                signer: *signer,
                account: applied.account,
                timestamp: now,
                fee: applied.fee,
                reputation: applied.reputation,
            }),
            Err(e) => {
                debug!(
                    signer = %signer,
                    instruction = instruction.name(),
                    class = ?e.class(),
                    error = %e,
                    "instruction rejected"
                );
                Err(e)
            }
        }
    }

    fn initialize_marketplace(
        state: &mut LedgerState,
        signer: &Address,
        fee_rate: u16,
    ) -> Result<Applied, LedgerError> {
        let fee_rate = FeeRate::new(fee_rate).map_err(|_| LedgerError::InvalidFeeRate(fee_rate))?;
        let (address, bump) = marketplace_address();
        if state.marketplace.is_some() {
            return Err(LedgerError::already_exists(AccountKind::Marketplace, address));
        }

        state.marketplace = Some(Marketplace {
            address,
            authority: *signer,
            fee_rate,
            total_listings: 0,
            total_users: 0,
            total_volume: Lamports::ZERO,
            bump,
        });
        info!(marketplace = %address, authority = %signer, fee_rate = %fee_rate, "marketplace initialized");
        Ok(Applied::account(address))
    }

    fn create_user_account(
        &self,
        state: &mut LedgerState,
        signer: &Address,
        display_name: &str,
        bio: &str,
        location: &str,
        now: i64,
    ) -> Result<Applied, LedgerError> {
        let limits = &self.config.limits;
        check_len(display_name, limits.display_name, |len, max| {
            LedgerError::DisplayNameTooLong { len, max }
        })?;
        check_len(bio, limits.bio, |len, max| LedgerError::BioTooLong { len, max })?;
        check_len(location, limits.location, |len, max| {
            LedgerError::LocationTooLong { len, max }
        })?;

        let total_users = state
            .marketplace()?
            .total_users
            .checked_add(1)
            .ok_or(LedgerError::Overflow("total_users"))?;
        let (address, bump) = user_address(signer);
        if state.users.contains_key(&address) {
            return Err(LedgerError::already_exists(AccountKind::User, address));
        }

        state.users.insert(address, UserAccount {
            address,
            authority: *signer,
            display_name: display_name.to_string(),
            bio: bio.to_string(),
            location: location.to_string(),
            reputation_score: 0,
            total_reviews: 0,
            total_sales: 0,
            total_purchases: 0,
            is_verified: false,
            verification_attestation: None,
            created_at: now,
            bump,
        });
        if let Some(marketplace) = state.marketplace.as_mut() {
            marketplace.total_users = total_users;
        }
        info!(user = %address, authority = %signer, display_name, "user account created");
        Ok(Applied::account(address))
    }

    fn update_profile(
        &self,
        state: &mut LedgerState,
        signer: &Address,
        user: &Address,
        display_name: Option<&str>,
        bio: Option<&str>,
        location: Option<&str>,
    ) -> Result<Applied, LedgerError> {
        let limits = &self.config.limits;
        if let Some(name) = display_name {
            check_len(name, limits.display_name, |len, max| {
                LedgerError::DisplayNameTooLong { len, max }
            })?;
        }
        if let Some(bio) = bio {
            check_len(bio, limits.bio, |len, max| LedgerError::BioTooLong { len, max })?;
        }
        if let Some(location) = location {
            check_len(location, limits.location, |len, max| {
                LedgerError::LocationTooLong { len, max }
            })?;
        }
        require_signer(&state.user(user)?.authority, signer)?;

        let account = state.user_mut(user)?;
        if let Some(name) = display_name {
            account.display_name = name.to_string();
        }
        if let Some(bio) = bio {
            account.bio = bio.to_string();
        }
        if let Some(location) = location {
            account.location = location.to_string();
        }
        info!(user = %user, "profile updated");
        Ok(Applied::account(*user))
    }

    fn update_verification(
        &self,
        state: &mut LedgerState,
        signer: &Address,
        user: &Address,
        attestation: &str,
    ) -> Result<Applied, LedgerError> {
        check_len(attestation, self.config.limits.attestation, |len, max| {
            LedgerError::AttestationTooLong { len, max }
        })?;
        require_signer(&state.user(user)?.authority, signer)?;

        let account = state.user_mut(user)?;
        account.is_verified = true;
        account.verification_attestation = Some(attestation.to_string());
        info!(user = %user, attestation, "user verified");
        Ok(Applied::account(*user))
    }

    fn create_listing(
        &self,
        state: &mut LedgerState,
        signer: &Address,
        new: NewListing<'_>,
        now: i64,
    ) -> Result<Applied, LedgerError> {
        let limits = &self.config.limits;
        check_len(new.title, limits.title, |len, max| LedgerError::TitleTooLong { len, max })?;
        check_len(new.description, limits.description, |len, max| {
            LedgerError::DescriptionTooLong { len, max }
        })?;
        for uri in [new.images_uri, new.metadata_uri] {
            check_len(uri, limits.uri, |len, max| LedgerError::UriTooLong { len, max })?;
        }
        if new.price.is_zero() {
            return Err(LedgerError::InvalidPrice);
        }

        let total_listings = state
            .marketplace()?
            .total_listings
            .checked_add(1)
            .ok_or(LedgerError::Overflow("total_listings"))?;
        state.user(&user_address(signer).0)?;
        let (address, bump) = listing_address(signer, new.title);
        if state.listings.contains_key(&address) {
            return Err(LedgerError::already_exists(AccountKind::Listing, address));
        }

        state.listings.insert(address, Listing {
            address,
            seller: *signer,
            buyer: None,
            title: new.title.to_string(),
            description: new.description.to_string(),
            category: new.category,
            price: new.price,
            condition: new.condition,
            images_uri: new.images_uri.to_string(),
            metadata_uri: new.metadata_uri.to_string(),
            is_active: true,
            is_sold: false,
            created_at: now,
            bump,
        });
        if let Some(marketplace) = state.marketplace.as_mut() {
            marketplace.total_listings = total_listings;
        }
        info!(
            listing = %address,
            seller = %signer,
            title = new.title,
            category = %new.category,
            price = %new.price,
            "listing created"
        );
        Ok(Applied::account(address))
    }

    fn update_listing_status(
        state: &mut LedgerState,
        signer: &Address,
        listing: &Address,
        active: bool,
    ) -> Result<Applied, LedgerError> {
        let current = state.listing(listing)?;
        require_signer(&current.seller, signer)?;
        if current.is_sold {
            return Err(LedgerError::ListingAlreadySold(*listing));
        }

        if let Some(entry) = state.listings.get_mut(listing) {
            entry.is_active = active;
        }
        info!(listing = %listing, active, "listing status updated");
        Ok(Applied::account(*listing))
    }

    /// The marketplace singleton, once initialized.
    pub fn marketplace(&self) -> Option<Marketplace> {
        self.state.lock().marketplace.clone()
    }

    /// The user account owned by `authority`.
    pub fn user(&self, authority: &Address) -> Option<UserAccount> {
        self.user_account(&user_address(authority).0)
    }

    /// The user account at `address`.
    pub fn user_account(&self, address: &Address) -> Option<UserAccount> {
        self.state.lock().users.get(address).cloned()
    }

    /// The listing at `address`.
    pub fn listing(&self, address: &Address) -> Option<Listing> {
        self.state.lock().listings.get(address).cloned()
    }

    /// The purchase at `address`.
    pub fn purchase(&self, address: &Address) -> Option<Purchase> {
        self.state.lock().purchases.get(address).cloned()
    }

    /// The review at `address`.
    pub fn review(&self, address: &Address) -> Option<Review> {
        self.state.lock().reviews.get(address).cloned()
    }

    /// All user accounts, ordered by address.
    pub fn users(&self) -> Vec<UserAccount> {
        self.state.lock().users.values().cloned().collect()
    }

    /// All listings, ordered by address.
    pub fn listings(&self) -> Vec<Listing> {
        self.state.lock().listings.values().cloned().collect()
    }

    /// All purchases, ordered by address.
    pub fn purchases(&self) -> Vec<Purchase> {
        self.state.lock().purchases.values().cloned().collect()
    }

    /// All reviews, ordered by address.
    pub fn reviews(&self) -> Vec<Review> {
        self.state.lock().reviews.values().cloned().collect()
    }

    /// Current reputation of `subject`.
    pub fn reputation(&self, subject: &Address) -> Option<ReputationData> {
        self.state.lock().reputation.get(subject)
    }

    /// Every reputation attestation for `subject`, oldest first.
    pub fn attestations(&self, subject: &Address) -> Vec<ReputationAttestation> {
        self.state
            .lock()
            .reputation
            .log()
            .history(subject)
            .into_iter()
            .cloned()
            .collect()
    }

    /// A consistent copy of the whole ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().to_snapshot()
    }
}

/// Borrowed arguments of `create_listing`.
pub(crate) struct NewListing<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) category: Category,
    pub(crate) price: Lamports,
    pub(crate) condition: Condition,
    pub(crate) images_uri: &'a str,
    pub(crate) metadata_uri: &'a str,
}
