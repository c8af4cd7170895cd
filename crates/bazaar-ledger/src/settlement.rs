//! Purchases and their settlement.
//!
//! A purchase moves the price out of the buyer's balance at once: the fee to
//! the marketplace account and the rest to the seller. The purchase record
//! then waits for the buyer to complete it, or for either party to dispute
//! it. Both flags are terminal; resolving a dispute is outside the ledger.

use bazaar_core::Address;
use bazaar_core::address::{purchase_address, user_address};
use bazaar_core::Purchase;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AccountKind, LedgerError};
use crate::processor::{Applied, Ledger, require_signer};
use crate::state::LedgerState;
use crate::transfer::{AssetTransfer, Transfer};

impl<B: AssetTransfer, C: Clock> Ledger<B, C> {
    pub(crate) fn purchase_item(
        &self,
        state: &mut LedgerState,
        signer: &Address,
        listing_addr: &Address,
        now: i64,
    ) -> Result<Applied, LedgerError> {
        let listing = state.listing(listing_addr)?;
        let marketplace = state.marketplace()?;
        let buyer_account = state.user(&user_address(signer).0)?;
        let seller_account = state.user(&user_address(&listing.seller).0)?;
        if !listing.is_purchasable() {
            return Err(LedgerError::ListingNotPurchasable(*listing_addr));
        }
        let (address, bump) = purchase_address(listing_addr, signer);
        if state.purchases.contains_key(&address) {
            return Err(LedgerError::already_exists(AccountKind::Purchase, address));
        }

        let price = listing.price;
        let seller = listing.seller;
        let split = marketplace.fee_rate.split(price);
        let total_volume = marketplace
            .total_volume
            .checked_add(price)
            .ok_or(LedgerError::Overflow("total_volume"))?;
        let total_sales = seller_account
            .total_sales
            .checked_add(1)
            .ok_or(LedgerError::Overflow("total_sales"))?;
        let total_purchases = buyer_account
            .total_purchases
            .checked_add(1)
            .ok_or(LedgerError::Overflow("total_purchases"))?;

        let transfers: Vec<Transfer> = [
            (seller, split.seller_proceeds),
            (marketplace.address, split.fee),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(to, amount)| Transfer {
            from: *signer,
            to,
            amount,
        })
        .collect();
        if let Err(e) = self.bank.transfer_all(&transfers) {
            warn!(listing = %listing_addr, buyer = %signer, error = %e, "purchase transfer failed");
            return Err(e.into());
        }

        state.purchases.insert(address, Purchase {
            address,
            buyer: *signer,
            seller,
            listing: *listing_addr,
            price,
            fee: split.fee,
            purchased_at: now,
            completed_at: None,
            is_completed: false,
            is_disputed: false,
            bump,
        });
        if let Some(listing) = state.listings.get_mut(listing_addr) {
            listing.is_sold = true;
            listing.is_active = false;
            listing.buyer = Some(*signer);
        }
        state.user_mut(&user_address(&seller).0)?.total_sales = total_sales;
        state.user_mut(&user_address(signer).0)?.total_purchases = total_purchases;
        if let Some(marketplace) = state.marketplace.as_mut() {
            marketplace.total_volume = total_volume;
        }

        info!(
            purchase = %address,
            listing = %listing_addr,
            buyer = %signer,
            price = %price,
            fee = %split.fee,
            "listing purchased"
        );
        Ok(Applied {
            account: address,
            fee: Some(split),
            reputation: None,
        })
    }

    pub(crate) fn complete_purchase(
        state: &mut LedgerState,
        signer: &Address,
        purchase_addr: &Address,
        now: i64,
    ) -> Result<Applied, LedgerError> {
        let purchase = state.purchase(purchase_addr)?;
        require_signer(&purchase.buyer, signer)?;
        ensure_open(purchase)?;

        if let Some(purchase) = state.purchases.get_mut(purchase_addr) {
            purchase.is_completed = true;
            purchase.completed_at = Some(now);
        }
        info!(purchase = %purchase_addr, buyer = %signer, "purchase completed");
        Ok(Applied::account(*purchase_addr))
    }

    pub(crate) fn open_dispute(
        state: &mut LedgerState,
        signer: &Address,
        purchase_addr: &Address,
    ) -> Result<Applied, LedgerError> {
        let purchase = state.purchase(purchase_addr)?;
        if purchase.seller != *signer {
            require_signer(&purchase.buyer, signer)?;
        }
        ensure_open(purchase)?;

        if let Some(purchase) = state.purchases.get_mut(purchase_addr) {
            purchase.is_disputed = true;
        }
        info!(purchase = %purchase_addr, party = %signer, "purchase disputed");
        Ok(Applied::account(*purchase_addr))
    }
}

fn ensure_open(purchase: &Purchase) -> Result<(), LedgerError> {
    if purchase.is_completed {
        return Err(LedgerError::PurchaseAlreadyCompleted(purchase.address));
    }
    if purchase.is_disputed {
        return Err(LedgerError::PurchaseDisputed(purchase.address));
    }
    Ok(())
}
