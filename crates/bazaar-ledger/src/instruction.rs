//! Ledger instructions and their signed envelope.
//!
//! An [`Instruction`] names what to do; the signer is supplied separately,
//! either directly to [`crate::Ledger::execute`] or inside a
//! [`SignedInstruction`] whose ed25519 signature covers the JSON encoding of
//! the instruction.
//!
//! The signature binds only the instruction, not a sequence number or a
//! point in time, so a captured [`SignedInstruction`] stays valid forever.
//! Creation instructions cannot be replayed because their accounts already
//! exist, but status and profile updates re-apply. Deduplication and
//! ordering of submissions belong to whatever layer sequences them into
//! [`crate::Ledger::submit`].

use bazaar_core::{Address, Category, Condition, FeeSplit, Keypair, Lamports, Signature};
use bazaar_reputation::ReputationData;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A state transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Create the marketplace singleton. The signer becomes its authority.
    InitializeMarketplace {
        /// Fee in basis points.
        fee_rate: u16,
    },
    /// Create the signer's user profile.
    CreateUserAccount {
        /// Public name.
        display_name: String,
        /// Free-form bio.
        bio: String,
        /// Free-form location.
        location: String,
    },
    /// Edit profile fields of a user account. Omitted fields are unchanged.
    UpdateProfile {
        /// User account address.
        user: Address,
        /// New display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        /// New bio.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bio: Option<String>,
        /// New location.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    /// Mark a user account as verified.
    UpdateVerification {
        /// User account address.
        user: Address,
        /// Opaque reference to the verifying attestation.
        attestation: String,
    },
    /// Offer an item for sale.
    CreateListing {
        /// Title, unique per seller.
        title: String,
        /// Description.
        description: String,
        /// Category.
        category: Category,
        /// Asking price.
        price: Lamports,
        /// Condition.
        condition: Condition,
        /// Image storage URI.
        images_uri: String,
        /// Metadata storage URI.
        metadata_uri: String,
    },
    /// Open or close a listing.
    UpdateListingStatus {
        /// Listing address.
        listing: Address,
        /// New active flag.
        active: bool,
    },
    /// Buy a listing.
    PurchaseItem {
        /// Listing address.
        listing: Address,
    },
    /// Confirm receipt of a purchased item.
    CompletePurchase {
        /// Purchase address.
        purchase: Address,
    },
    /// Flag a purchase as disputed.
    OpenDispute {
        /// Purchase address.
        purchase: Address,
    },
    /// Rate the other party of a completed purchase.
    LeaveReview {
        /// Purchase address.
        purchase: Address,
        /// Stars, `1..=5`.
        rating: u8,
        /// Free-form comment.
        comment: String,
        /// True when rating the seller.
        is_seller_review: bool,
    },
}

impl Instruction {
    /// Short name of the instruction kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitializeMarketplace { .. } => "initialize_marketplace",
            Self::CreateUserAccount { .. } => "create_user_account",
            Self::UpdateProfile { .. } => "update_profile",
            Self::UpdateVerification { .. } => "update_verification",
            Self::CreateListing { .. } => "create_listing",
            Self::UpdateListingStatus { .. } => "update_listing_status",
            Self::PurchaseItem { .. } => "purchase_item",
            Self::CompletePurchase { .. } => "complete_purchase",
            Self::OpenDispute { .. } => "open_dispute",
            Self::LeaveReview { .. } => "leave_review",
        }
    }

    /// Canonical bytes covered by a signature.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Serialization` if encoding fails.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// An instruction together with its signer and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInstruction {
    /// Claimed signer.
    pub signer: Address,
    /// The instruction.
    pub instruction: Instruction,
    /// Signature over [`Instruction::signing_bytes`].
    pub signature: Signature,
}

impl SignedInstruction {
    /// Signs `instruction` with `keypair`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Serialization` if encoding fails.
    pub fn sign(keypair: &Keypair, instruction: Instruction) -> Result<Self, LedgerError> {
        let signature = keypair.sign(&instruction.signing_bytes()?);
        Ok(Self {
            signer: keypair.address(),
            instruction,
            signature,
        })
    }

    /// Checks the signature against the claimed signer.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidSignature` on mismatch.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let bytes = self.instruction.signing_bytes()?;
        self.signer
            .verify(&bytes, &self.signature)
            .map_err(|_| LedgerError::InvalidSignature)
    }
}

/// Result of an applied instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Instruction kind.
    pub instruction: String,
    /// Signer.
    pub signer: Address,
    /// Primary account created or modified.
    pub account: Address,
    /// Ledger time the instruction was applied.
    pub timestamp: i64,
    /// Fee split of a purchase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<FeeSplit>,
    /// Reviewee reputation after a review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<ReputationData>,
}
