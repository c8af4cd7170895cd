//! Native asset transfers backing purchases.
//!
//! The ledger never moves funds itself. It hands the transfers of an
//! instruction to an [`AssetTransfer`] implementation as one batch; the batch
//! either applies completely or not at all, and the instruction fails with it.

use std::collections::HashMap;

use bazaar_core::{Address, Lamports};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single movement of funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Debited account.
    pub from: Address,
    /// Credited account.
    pub to: Address,
    /// Amount moved.
    pub amount: Lamports,
}

/// Errors from an asset transfer batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Debited account cannot cover the amount.
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// Debited account.
        account: Address,
        /// Amount required.
        required: Lamports,
        /// Balance at the time of the transfer.
        available: Lamports,
    },

    /// Credited balance would overflow.
    #[error("balance overflow in {0}")]
    Overflow(Address),

    /// The backend refused the batch.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Moves native assets between accounts.
pub trait AssetTransfer: Send + Sync {
    /// Applies every transfer in order, or none of them.
    ///
    /// # Errors
    ///
    /// Returns the first failing transfer's error; balances are unchanged.
    fn transfer_all(&self, transfers: &[Transfer]) -> Result<(), TransferError>;
}

/// Balances kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    balances: Mutex<HashMap<Address, Lamports>>,
}

impl InMemoryBank {
    /// Creates an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to `account` from outside the ledger.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Overflow` if the balance would overflow.
    pub fn fund(&self, account: Address, amount: Lamports) -> Result<(), TransferError> {
        let mut balances = self.balances.lock();
        let balance = balances.entry(account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow(account))?;
        Ok(())
    }

    /// Current balance of `account`.
    #[must_use]
    pub fn balance(&self, account: &Address) -> Lamports {
        self.balances.lock().get(account).copied().unwrap_or_default()
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> u128 {
        self.balances
            .lock()
            .values()
            .map(|b| u128::from(b.get()))
            .sum()
    }
}

impl AssetTransfer for InMemoryBank {
    fn transfer_all(&self, transfers: &[Transfer]) -> Result<(), TransferError> {
        let mut balances = self.balances.lock();
        let mut pending: HashMap<Address, Lamports> = HashMap::new();

        for transfer in transfers {
            let current = |pending: &HashMap<Address, Lamports>, account: &Address| {
                pending
                    .get(account)
                    .or_else(|| balances.get(account))
                    .copied()
                    .unwrap_or_default()
            };

            let available = current(&pending, &transfer.from);
            let debited =
                available
                    .checked_sub(transfer.amount)
                    .ok_or(TransferError::InsufficientFunds {
                        account: transfer.from,
                        required: transfer.amount,
                        available,
                    })?;
            pending.insert(transfer.from, debited);

            let credited = current(&pending, &transfer.to)
                .checked_add(transfer.amount)
                .ok_or(TransferError::Overflow(transfer.to))?;
            pending.insert(transfer.to, credited);
        }

        balances.extend(pending);
        Ok(())
    }
}
