//! End-to-end tests for the marketplace lifecycle.
//!
//! 1. Marketplace initialization
//! 2. User registration and verification
//! 3. Listing creation
//! 4. Purchase with fee split
//! 5. Completion and reviews feeding reputation
//! 6. Discovery over the resulting listings

use bazaar_core::address::{listing_address, marketplace_address, purchase_address, user_address};
use bazaar_core::{Address, Category, Condition, Keypair, Lamports};
use bazaar_ledger::{
    ErrorClass, InMemoryBank, Instruction, Ledger, LedgerConfig, LedgerError, LedgerSnapshot,
    ManualClock, Receipt, SignedInstruction,
};
use bazaar_query::{FilterUpdate, ListingFilter, MarketplaceState, NoDirectory, apply_filter};

// ============================================================================
// Helper Functions
// ============================================================================

type TestLedger = Ledger<InMemoryBank, ManualClock>;

const MACBOOK_PRICE: u64 = 2_500_000_000;

fn keypair(seed: u8) -> Keypair {
    Keypair::from_seed(&[seed; 32])
}

fn new_ledger() -> TestLedger {
    Ledger::new(LedgerConfig::default(), InMemoryBank::new(), ManualClock::new(1_000))
        .expect("ledger")
}

fn submit(
    ledger: &TestLedger,
    signer: &Keypair,
    instruction: Instruction,
) -> Result<Receipt, LedgerError> {
    let signed = SignedInstruction::sign(signer, instruction).expect("sign");
    let receipt = ledger.submit(&signed);
    ledger.clock().advance(1);
    receipt
}

fn register(ledger: &TestLedger, user: &Keypair, name: &str, location: &str) {
    ledger
        .bank()
        .fund(user.address(), Lamports::new(10 * MACBOOK_PRICE))
        .expect("fund");
    submit(ledger, user, Instruction::CreateUserAccount {
        display_name: name.to_string(),
        bio: String::new(),
        location: location.to_string(),
    })
    .expect("create user");
}

fn list(
    ledger: &TestLedger,
    seller: &Keypair,
    title: &str,
    category: Category,
    price: u64,
) -> Address {
    submit(ledger, seller, Instruction::CreateListing {
        title: title.to_string(),
        description: format!("{title} in great shape"),
        category,
        price: Lamports::new(price),
        condition: Condition::LikeNew,
        images_uri: "ipfs://images".to_string(),
        metadata_uri: "ipfs://metadata".to_string(),
    })
    .expect("create listing")
    .account
}

/// Marketplace at fee 250 with Alice (seller) and Bob (buyer) registered.
fn marketplace() -> (TestLedger, Keypair, Keypair) {
    let ledger = new_ledger();
    let admin = keypair(0);
    submit(&ledger, &admin, Instruction::InitializeMarketplace { fee_rate: 250 }).expect("init");
    let alice = keypair(1);
    let bob = keypair(2);
    register(&ledger, &alice, "Alice", "Amsterdam, NL");
    register(&ledger, &bob, "Bob", "Berlin, DE");
    (ledger, alice, bob)
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn initialize_creates_empty_marketplace() {
    let ledger = new_ledger();
    let receipt = submit(&ledger, &keypair(0), Instruction::InitializeMarketplace { fee_rate: 250 })
        .expect("init");

    let marketplace = ledger.marketplace().expect("marketplace");
    assert_eq!(receipt.account, marketplace_address().0);
    assert_eq!(marketplace.fee_rate.bps(), 250);
    assert_eq!(marketplace.total_listings, 0);
    assert_eq!(marketplace.total_users, 0);
    assert_eq!(marketplace.total_volume, Lamports::ZERO);
    assert_eq!(marketplace.authority, keypair(0).address());
}

#[test]
fn user_registration_counts_users() {
    let ledger = new_ledger();
    submit(&ledger, &keypair(0), Instruction::InitializeMarketplace { fee_rate: 250 }).expect("init");
    let alice = keypair(1);
    submit(&ledger, &alice, Instruction::CreateUserAccount {
        display_name: "Alice".to_string(),
        bio: "I love buying and selling items!".to_string(),
        location: "Amsterdam, NL".to_string(),
    })
    .expect("create user");

    let account = ledger.user(&alice.address()).expect("account");
    assert_eq!(account.address, user_address(&alice.address()).0);
    assert_eq!(account.reputation_score, 0);
    assert!(!account.is_verified);
    assert_eq!(ledger.marketplace().expect("marketplace").total_users, 1);
}

#[test]
fn full_purchase_flow() {
    let (ledger, alice, bob) = marketplace();
    let listing = list(&ledger, &alice, "MacBook Pro M2", Category::Electronics, MACBOOK_PRICE);
    assert_eq!(listing, listing_address(&alice.address(), "MacBook Pro M2").0);

    let created = ledger.listing(&listing).expect("listing");
    assert!(created.is_active);
    assert!(!created.is_sold);
    assert_eq!(ledger.marketplace().expect("marketplace").total_listings, 1);

    let alice_before = ledger.bank().balance(&alice.address());
    let bob_before = ledger.bank().balance(&bob.address());

    let receipt = submit(&ledger, &bob, Instruction::PurchaseItem { listing }).expect("purchase");
    let split = receipt.fee.expect("fee split");
    assert_eq!(split.fee, Lamports::new(62_500_000));
    assert_eq!(split.seller_proceeds, Lamports::new(2_437_500_000));

    let sold = ledger.listing(&listing).expect("listing");
    assert!(sold.is_sold);
    assert!(!sold.is_active);
    assert_eq!(sold.buyer, Some(bob.address()));

    let marketplace = ledger.marketplace().expect("marketplace");
    assert_eq!(marketplace.total_volume, Lamports::new(MACBOOK_PRICE));

    assert_eq!(
        ledger.bank().balance(&alice.address()).get(),
        alice_before.get() + 2_437_500_000
    );
    assert_eq!(
        ledger.bank().balance(&bob.address()).get(),
        bob_before.get() - MACBOOK_PRICE
    );
    assert_eq!(ledger.bank().balance(&marketplace.address), Lamports::new(62_500_000));

    let purchase = purchase_address(&listing, &bob.address()).0;
    assert_eq!(receipt.account, purchase);
    assert_eq!(ledger.user(&alice.address()).expect("alice").total_sales, 1);
    assert_eq!(ledger.user(&bob.address()).expect("bob").total_purchases, 1);
}

#[test]
fn sold_listing_rejects_second_buyer() {
    let (ledger, alice, bob) = marketplace();
    let carol = keypair(3);
    register(&ledger, &carol, "Carol", "Lisbon, PT");
    let listing = list(&ledger, &alice, "MacBook Pro M2", Category::Electronics, MACBOOK_PRICE);

    submit(&ledger, &bob, Instruction::PurchaseItem { listing }).expect("purchase");
    let err = submit(&ledger, &carol, Instruction::PurchaseItem { listing }).expect_err("sold");
    assert_eq!(err, LedgerError::ListingNotPurchasable(listing));
    assert_eq!(err.class(), ErrorClass::StateConflict);

    let err = submit(&ledger, &alice, Instruction::UpdateListingStatus { listing, active: true })
        .expect_err("terminal");
    assert_eq!(err, LedgerError::ListingAlreadySold(listing));
    assert_eq!(ledger.purchases().len(), 1);
}

#[test]
fn reviews_drive_seller_reputation() {
    let (ledger, alice, bob) = marketplace();
    let mut scores = Vec::new();

    for (index, rating) in [5_u8, 3, 5].into_iter().enumerate() {
        let title = format!("Vinyl record {index}");
        let listing = list(&ledger, &alice, &title, Category::Art, 1_000_000);
        let purchase = submit(&ledger, &bob, Instruction::PurchaseItem { listing })
            .expect("purchase")
            .account;

        let err = submit(&ledger, &bob, Instruction::LeaveReview {
            purchase,
            rating,
            comment: "too early".to_string(),
            is_seller_review: true,
        })
        .expect_err("not completed");
        assert_eq!(err, LedgerError::ReviewRequiresCompletedPurchase(purchase));

        submit(&ledger, &bob, Instruction::CompletePurchase { purchase }).expect("complete");
        let receipt = submit(&ledger, &bob, Instruction::LeaveReview {
            purchase,
            rating,
            comment: "thanks".to_string(),
            is_seller_review: true,
        })
        .expect("review");
        scores.push(receipt.reputation.expect("reputation"));
    }

    assert_eq!(scores.iter().map(|r| r.score).collect::<Vec<_>>(), vec![500, 480, 482]);
    assert_eq!(
        scores.iter().map(|r| r.positive_rating).collect::<Vec<_>>(),
        vec![100, 50, 67]
    );
    assert_eq!(scores[2].verified_sales, 3);

    let account = ledger.user(&alice.address()).expect("alice");
    assert_eq!(account.reputation_score, 482);
    assert_eq!(account.total_reviews, 3);
    assert_eq!(ledger.attestations(&alice.address()).len(), 3);
    assert_eq!(ledger.reputation(&bob.address()), None);
}

#[test]
fn buyer_review_is_signed_by_seller() {
    let (ledger, alice, bob) = marketplace();
    let listing = list(&ledger, &alice, "Desk lamp", Category::Home, 50_000_000);
    let purchase = submit(&ledger, &bob, Instruction::PurchaseItem { listing })
        .expect("purchase")
        .account;
    submit(&ledger, &bob, Instruction::CompletePurchase { purchase }).expect("complete");

    let review = Instruction::LeaveReview {
        purchase,
        rating: 4,
        comment: "paid promptly".to_string(),
        is_seller_review: false,
    };
    let err = submit(&ledger, &bob, review.clone()).expect_err("wrong reviewer");
    assert_eq!(err.class(), ErrorClass::Authorization);

    submit(&ledger, &alice, review.clone()).expect("review");
    assert_eq!(ledger.user(&bob.address()).expect("bob").reputation_score, 400);

    let err = submit(&ledger, &alice, review).expect_err("duplicate");
    assert!(matches!(err, LedgerError::AccountAlreadyExists { .. }));
}

#[test]
fn disputed_purchase_cannot_complete() {
    let (ledger, alice, bob) = marketplace();
    let listing = list(&ledger, &alice, "Camera", Category::Electronics, 700_000_000);
    let purchase = submit(&ledger, &bob, Instruction::PurchaseItem { listing })
        .expect("purchase")
        .account;

    submit(&ledger, &alice, Instruction::OpenDispute { purchase }).expect("dispute");
    let err = submit(&ledger, &bob, Instruction::CompletePurchase { purchase }).expect_err("disputed");
    assert_eq!(err, LedgerError::PurchaseDisputed(purchase));
    assert!(ledger.purchase(&purchase).expect("purchase").is_disputed);
}

// ============================================================================
// Signatures
// ============================================================================

#[test]
fn tampered_instruction_is_rejected() {
    let (ledger, alice, _bob) = marketplace();
    let listing = list(&ledger, &alice, "Bike", Category::Sports, 900_000_000);

    let mut signed =
        SignedInstruction::sign(&alice, Instruction::UpdateListingStatus { listing, active: false })
            .expect("sign");
    signed.instruction = Instruction::UpdateListingStatus { listing, active: true };

    let err = ledger.submit(&signed).expect_err("tampered");
    assert_eq!(err, LedgerError::InvalidSignature);
    assert!(ledger.listing(&listing).expect("listing").is_active);
}

#[test]
fn signer_must_own_listing() {
    let (ledger, alice, bob) = marketplace();
    let listing = list(&ledger, &alice, "Bike", Category::Sports, 900_000_000);

    let err = submit(&ledger, &bob, Instruction::UpdateListingStatus { listing, active: false })
        .expect_err("not owner");
    assert_eq!(err, LedgerError::Unauthorized {
        expected: alice.address(),
        actual: bob.address(),
    });
}

// ============================================================================
// Persistence and discovery
// ============================================================================

#[test]
fn snapshot_restores_equivalent_ledger() {
    let (ledger, alice, bob) = marketplace();
    let listing = list(&ledger, &alice, "MacBook Pro M2", Category::Electronics, MACBOOK_PRICE);
    let purchase = submit(&ledger, &bob, Instruction::PurchaseItem { listing })
        .expect("purchase")
        .account;
    submit(&ledger, &bob, Instruction::CompletePurchase { purchase }).expect("complete");
    submit(&ledger, &bob, Instruction::LeaveReview {
        purchase,
        rating: 5,
        comment: String::new(),
        is_seller_review: true,
    })
    .expect("review");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");
    ledger.snapshot().save(&path).expect("save");

    let restored = Ledger::restore(
        LedgerConfig::default(),
        InMemoryBank::new(),
        ManualClock::new(5_000),
        LedgerSnapshot::load(&path).expect("load"),
    )
    .expect("restore");

    assert_eq!(restored.marketplace(), ledger.marketplace());
    assert_eq!(restored.listings(), ledger.listings());
    assert_eq!(restored.reviews(), ledger.reviews());
    assert_eq!(restored.reputation(&alice.address()).map(|r| r.score), Some(500));

    // A restored ledger keeps rejecting what the original rejected.
    let err = restored
        .execute(&bob.address(), &Instruction::PurchaseItem { listing })
        .expect_err("still sold");
    assert_eq!(err, LedgerError::ListingNotPurchasable(listing));
}

#[test]
fn discovery_over_ledger_listings() {
    let (ledger, alice, bob) = marketplace();
    list(&ledger, &alice, "MacBook Pro M2", Category::Electronics, MACBOOK_PRICE);
    list(&ledger, &bob, "Winter jacket", Category::Clothing, 120_000_000);
    let listings = ledger.listings();

    let filter = ListingFilter {
        category: Some(Category::Electronics),
        search: Some("macbook".to_string()),
        ..ListingFilter::default()
    };
    let found = apply_filter(&listings, &filter, &NoDirectory);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "MacBook Pro M2");

    let filter = ListingFilter {
        category: Some(Category::Books),
        ..ListingFilter::default()
    };
    assert!(apply_filter(&listings, &filter, &NoDirectory).is_empty());

    let mut state = MarketplaceState::new();
    state.set_sellers(ledger.users());
    state.set_listings(listings);
    state
        .set_filter(FilterUpdate {
            location: Some(Some("berlin".to_string())),
            ..FilterUpdate::default()
        })
        .expect("filter");
    assert_eq!(state.filtered().len(), 1);
    assert_eq!(state.filtered()[0].seller, bob.address());
}

#[test]
fn snapshot_json_is_readable() {
    let (ledger, alice, _bob) = marketplace();
    list(&ledger, &alice, "Bike", Category::Sports, 900_000_000);

    let json: serde_json::Value =
        serde_json::from_str(&ledger.snapshot().to_json().expect("json")).expect("parse");
    assert_eq!(json["listings"][0]["category"], "Sports");
    assert_eq!(json["listings"][0]["price"], 900_000_000);
    assert_eq!(json["users"].as_array().map(Vec::len), Some(2));
}
