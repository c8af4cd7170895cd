//! # bazaar-ledger
//!
//! The marketplace ledger state machine.
//!
//! This crate provides:
//!
//! - [`Ledger`] - applies [`Instruction`]s atomically to the account store
//! - [`SignedInstruction`] - ed25519-signed instruction envelope
//! - [`AssetTransfer`] - the seam to the native asset, with [`InMemoryBank`]
//! - [`Clock`] - timestamp source, with [`SystemClock`] and [`ManualClock`]
//! - [`LedgerSnapshot`] - JSON persistence of the whole ledger
//!
//! # Example
//!
//! ```
//! use bazaar_core::{Category, Condition, Keypair, Lamports};
//! use bazaar_ledger::{InMemoryBank, Instruction, Ledger, LedgerConfig, ManualClock};
//!
//! let ledger = Ledger::new(LedgerConfig::default(), InMemoryBank::new(), ManualClock::new(0))?;
//! let admin = Keypair::from_seed(&[0; 32]).address();
//! let alice = Keypair::from_seed(&[1; 32]).address();
//!
//! ledger.execute(&admin, &Instruction::InitializeMarketplace { fee_rate: 250 })?;
//! ledger.execute(&alice, &Instruction::CreateUserAccount {
//!     display_name: "Alice".into(),
//!     bio: String::new(),
//!     location: "Amsterdam, NL".into(),
//! })?;
//! let listing = ledger.execute(&alice, &Instruction::CreateListing {
//!     title: "MacBook Pro M2".into(),
//!     description: String::new(),
//!     category: Category::Electronics,
//!     price: Lamports::new(2_500_000_000),
//!     condition: Condition::LikeNew,
//!     images_uri: String::new(),
//!     metadata_uri: String::new(),
//! })?;
//!
//! assert_eq!(ledger.marketplace().map(|m| m.total_listings), Some(1));
//! assert!(ledger.listing(&listing.account).is_some_and(|l| l.is_active));
//! # Ok::<(), bazaar_ledger::LedgerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod instruction;
pub mod processor;
mod review;
mod settlement;
pub mod snapshot;
mod state;
pub mod transfer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{AccountKind, ErrorClass, LedgerError};
pub use instruction::{Instruction, Receipt, SignedInstruction};
pub use processor::Ledger;
pub use snapshot::LedgerSnapshot;
pub use transfer::{AssetTransfer, InMemoryBank, Transfer, TransferError};
