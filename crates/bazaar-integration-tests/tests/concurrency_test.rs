//! Concurrent submissions against one ledger.
//!
//! Each instruction is applied under a single lock, so racing buyers of one
//! listing see exactly one winner and counters never lose updates.

use std::sync::Barrier;
use std::thread;

use bazaar_core::{Category, Condition, Keypair, Lamports};
use bazaar_ledger::{
    InMemoryBank, Instruction, Ledger, LedgerConfig, LedgerError, ManualClock, SignedInstruction,
};

type TestLedger = Ledger<InMemoryBank, ManualClock>;

const BUYERS: u8 = 8;

fn keypair(seed: u8) -> Keypair {
    Keypair::from_seed(&[seed; 32])
}

fn signed(signer: &Keypair, instruction: Instruction) -> SignedInstruction {
    SignedInstruction::sign(signer, instruction).expect("sign")
}

fn create_user(name: &str) -> Instruction {
    Instruction::CreateUserAccount {
        display_name: name.to_string(),
        bio: String::new(),
        location: String::new(),
    }
}

fn initialized() -> TestLedger {
    let ledger = Ledger::new(LedgerConfig::default(), InMemoryBank::new(), ManualClock::new(0))
        .expect("ledger");
    ledger
        .submit(&signed(&keypair(0), Instruction::InitializeMarketplace { fee_rate: 250 }))
        .expect("init");
    ledger
}

#[test]
fn racing_buyers_have_one_winner() {
    let ledger = initialized();
    let seller = keypair(1);
    ledger.submit(&signed(&seller, create_user("seller"))).expect("seller");
    let listing = ledger
        .submit(&signed(&seller, Instruction::CreateListing {
            title: "Limited sneakers".to_string(),
            description: "Size 42".to_string(),
            category: Category::Clothing,
            price: Lamports::new(1_000_000_000),
            condition: Condition::New,
            images_uri: String::new(),
            metadata_uri: String::new(),
        }))
        .expect("listing")
        .account;

    let buyers: Vec<Keypair> = (10..10 + BUYERS).map(keypair).collect();
    for (index, buyer) in buyers.iter().enumerate() {
        ledger
            .bank()
            .fund(buyer.address(), Lamports::new(5_000_000_000))
            .expect("fund");
        ledger
            .submit(&signed(buyer, create_user(&format!("buyer-{index}"))))
            .expect("buyer");
    }
    let supply = ledger.bank().total_supply();

    let barrier = Barrier::new(buyers.len());
    let results: Vec<Result<_, LedgerError>> = thread::scope(|scope| {
        let handles: Vec<_> = buyers
            .iter()
            .map(|buyer| {
                let ledger = &ledger;
                let barrier = &barrier;
                let purchase = signed(buyer, Instruction::PurchaseItem { listing });
                scope.spawn(move || {
                    barrier.wait();
                    ledger.submit(&purchase)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(result.as_ref().err(), Some(&LedgerError::ListingNotPurchasable(listing)));
    }

    let sold = ledger.listing(&listing).expect("listing");
    let winner = sold.buyer.expect("buyer");
    assert!(buyers.iter().any(|b| b.address() == winner));
    assert_eq!(ledger.purchases().len(), 1);
    assert_eq!(
        ledger.marketplace().expect("marketplace").total_volume,
        Lamports::new(1_000_000_000)
    );
    assert_eq!(ledger.bank().balance(&winner), Lamports::new(4_000_000_000));
    assert_eq!(ledger.bank().total_supply(), supply);
}

#[test]
fn concurrent_registrations_are_all_counted() {
    let ledger = initialized();
    let users: Vec<Keypair> = (1..=32).map(keypair).collect();

    thread::scope(|scope| {
        for (index, user) in users.iter().enumerate() {
            let ledger = &ledger;
            scope.spawn(move || {
                ledger
                    .submit(&signed(user, create_user(&format!("user-{index}"))))
                    .expect("create user");
            });
        }
    });

    assert_eq!(ledger.marketplace().expect("marketplace").total_users, 32);
    assert_eq!(ledger.users().len(), 32);
}

#[test]
fn duplicate_registration_race_creates_one_account() {
    let ledger = initialized();
    let user = keypair(1);
    let barrier = Barrier::new(4);

    let successes: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = &ledger;
                let barrier = &barrier;
                let instruction = signed(&user, create_user("twin"));
                scope.spawn(move || {
                    barrier.wait();
                    usize::from(ledger.submit(&instruction).is_ok())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread")).sum()
    });

    assert_eq!(successes, 1);
    assert_eq!(ledger.marketplace().expect("marketplace").total_users, 1);
}
