//! Property tests over random instruction sequences.
//!
//! Whatever mix of listings, status changes and purchases is applied, and
//! whichever of them are rejected:
//! - marketplace counters and volume never decrease
//! - volume equals the summed price of sold listings
//! - a sold listing stays sold and inactive
//! - funds are neither created nor destroyed

use std::collections::BTreeSet;

use bazaar_core::{Address, Category, Condition, Keypair, Lamports};
use bazaar_ledger::{InMemoryBank, Instruction, Ledger, LedgerConfig, ManualClock};
use proptest::prelude::*;

const USERS: u8 = 4;

#[derive(Debug, Clone)]
enum Op {
    List { seller: u8, price: u64 },
    SetActive { seller: u8, listing: usize, active: bool },
    Buy { buyer: u8, listing: usize },
    Complete { buyer: u8, purchase: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS, 1_u64..5_000_000_000).prop_map(|(seller, price)| Op::List { seller, price }),
        (0..USERS, 0_usize..16, any::<bool>())
            .prop_map(|(seller, listing, active)| Op::SetActive { seller, listing, active }),
        (0..USERS, 0_usize..16).prop_map(|(buyer, listing)| Op::Buy { buyer, listing }),
        (0..USERS, 0_usize..16).prop_map(|(buyer, purchase)| Op::Complete { buyer, purchase }),
    ]
}

fn keypair(index: u8) -> Keypair {
    Keypair::from_seed(&[index + 1; 32])
}

fn address(index: u8) -> Address {
    keypair(index).address()
}

fn nth(addresses: &[Address], index: usize) -> Option<Address> {
    if addresses.is_empty() {
        None
    } else {
        Some(addresses[index % addresses.len()])
    }
}

fn setup() -> Ledger<InMemoryBank, ManualClock> {
    let ledger = Ledger::new(LedgerConfig::default(), InMemoryBank::new(), ManualClock::new(0))
        .expect("ledger");
    ledger
        .execute(&Address::new([0xAA; 32]), &Instruction::InitializeMarketplace { fee_rate: 300 })
        .expect("init");
    for index in 0..USERS {
        ledger
            .bank()
            .fund(address(index), Lamports::new(8_000_000_000))
            .expect("fund");
        ledger
            .execute(&address(index), &Instruction::CreateUserAccount {
                display_name: format!("user-{index}"),
                bio: String::new(),
                location: String::new(),
            })
            .expect("user");
    }
    ledger
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledger_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let ledger = setup();
        let supply = ledger.bank().total_supply();
        let mut sold = BTreeSet::new();
        let mut last = ledger.marketplace().expect("marketplace");

        for (step, op) in ops.iter().enumerate() {
            let listings: Vec<Address> = ledger.listings().iter().map(|l| l.address).collect();
            let purchases: Vec<Address> = ledger.purchases().iter().map(|p| p.address).collect();
            let (signer, instruction) = match *op {
                Op::List { seller, price } => (address(seller), Instruction::CreateListing {
                    title: format!("item-{step}"),
                    description: String::new(),
                    category: Category::Books,
                    price: Lamports::new(price),
                    condition: Condition::Good,
                    images_uri: String::new(),
                    metadata_uri: String::new(),
                }),
                Op::SetActive { seller, listing, active } => {
                    let Some(listing) = nth(&listings, listing) else { continue };
                    (address(seller), Instruction::UpdateListingStatus { listing, active })
                }
                Op::Buy { buyer, listing } => {
                    let Some(listing) = nth(&listings, listing) else { continue };
                    (address(buyer), Instruction::PurchaseItem { listing })
                }
                Op::Complete { buyer, purchase } => {
                    let Some(purchase) = nth(&purchases, purchase) else { continue };
                    (address(buyer), Instruction::CompletePurchase { purchase })
                }
            };
            let _ = ledger.execute(&signer, &instruction);
            ledger.clock().advance(1);

            let now = ledger.marketplace().expect("marketplace");
            prop_assert!(now.total_listings >= last.total_listings);
            prop_assert!(now.total_users >= last.total_users);
            prop_assert!(now.total_volume >= last.total_volume);
            last = now;

            let listings = ledger.listings();
            let volume: u64 = listings.iter().filter(|l| l.is_sold).map(|l| l.price.get()).sum();
            prop_assert_eq!(last.total_volume, Lamports::new(volume));
            prop_assert_eq!(last.total_listings, listings.len() as u64);

            for listing in &listings {
                if sold.contains(&listing.address) {
                    prop_assert!(listing.is_sold);
                    prop_assert!(!listing.is_active);
                }
                if listing.is_sold {
                    prop_assert!(listing.buyer.is_some());
                    sold.insert(listing.address);
                }
            }
            prop_assert_eq!(ledger.bank().total_supply(), supply);
        }
    }
}
