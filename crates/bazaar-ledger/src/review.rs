//! Reviews and the reputation update they trigger.

use bazaar_core::address::{review_address, user_address};
use bazaar_core::{Address, Review};
use bazaar_reputation::TransactionOutcome;
use tracing::info;

use crate::clock::Clock;
use crate::error::{AccountKind, LedgerError};
use crate::processor::{Applied, Ledger, check_len, require_signer};
use crate::state::LedgerState;
use crate::transfer::AssetTransfer;

/// Borrowed arguments of `leave_review`.
pub(crate) struct NewReview<'a> {
    pub(crate) purchase: &'a Address,
    pub(crate) rating: u8,
    pub(crate) comment: &'a str,
    pub(crate) is_seller_review: bool,
}

impl<B: AssetTransfer, C: Clock> Ledger<B, C> {
    /// Records a review of one purchase party by the other.
    ///
    /// A seller review rates the seller and must be signed by the buyer; a
    /// buyer review is the reverse. The reviewee's reputation is updated and
    /// its score copied onto the reviewee's user account.
    pub(crate) fn leave_review(
        &self,
        state: &mut LedgerState,
        signer: &Address,
        new: NewReview<'_>,
        now: i64,
    ) -> Result<Applied, LedgerError> {
        if !(1..=5).contains(&new.rating) {
            return Err(LedgerError::InvalidRating(new.rating));
        }
        check_len(new.comment, self.config.limits.comment, |len, max| {
            LedgerError::CommentTooLong { len, max }
        })?;

        let purchase = state.purchase(new.purchase)?;
        let (reviewer, reviewee) = if new.is_seller_review {
            (purchase.buyer, purchase.seller)
        } else {
            (purchase.seller, purchase.buyer)
        };
        require_signer(&reviewer, signer)?;
        if !purchase.is_completed {
            return Err(LedgerError::ReviewRequiresCompletedPurchase(*new.purchase));
        }
        let (address, bump) = review_address(new.purchase, signer);
        if state.reviews.contains_key(&address) {
            return Err(LedgerError::already_exists(AccountKind::Review, address));
        }
        let reviewee_account = user_address(&reviewee).0;
        let total_reviews = state
            .user(&reviewee_account)?
            .total_reviews
            .checked_add(1)
            .ok_or(LedgerError::Overflow("total_reviews"))?;

        let outcome = TransactionOutcome::new(
            new.rating,
            purchase.price,
            purchase.is_completed && !purchase.is_disputed,
            new.is_seller_review,
        );
        let reputation = state.reputation.update(reviewee, &outcome, now)?;

        state.reviews.insert(address, Review {
            address,
            reviewer,
            reviewee,
            purchase: *new.purchase,
            rating: new.rating,
            comment: new.comment.to_string(),
            is_seller_review: new.is_seller_review,
            created_at: now,
            bump,
        });
        let account = state.user_mut(&reviewee_account)?;
        account.total_reviews = total_reviews;
        account.reputation_score = reputation.score;

        info!(
            review = %address,
            reviewer = %reviewer,
            reviewee = %reviewee,
            rating = new.rating,
            score = reputation.score,
            "review recorded"
        );
        Ok(Applied {
            account: address,
            fee: None,
            reputation: Some(reputation),
        })
    }
}
