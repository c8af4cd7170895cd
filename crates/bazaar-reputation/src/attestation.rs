//! Append-only reputation attestations.
//!
//! Each reputation update produces a new record for its subject. Records carry a
//! per-subject sequence number and a blake3 digest chained from the previous
//! record, so history can be audited and any edit to an older record is
//! detectable. Superseded records are never removed.

use std::collections::HashMap;

use bazaar_core::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::ReputationData;
use crate::error::ReputationError;

/// A reputation claim about `subject` issued by `issuer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationAttestation {
    /// Unique record identifier.
    pub id: Uuid,
    /// Identity the claim is about.
    pub subject: Address,
    /// Identity that issued the claim.
    pub issuer: Address,
    /// Position in the subject's history, starting at 0.
    pub sequence: u64,
    /// The reputation values.
    pub data: ReputationData,
    /// Unix timestamp of issue.
    pub issued_at: i64,
    /// Digest of the previous record for this subject.
    pub previous: Option<[u8; 32]>,
    /// Digest of this record.
    pub digest: [u8; 32],
}

impl ReputationAttestation {
    fn compute_digest(
        previous: Option<&[u8; 32]>,
        subject: &Address,
        issuer: &Address,
        sequence: u64,
        data: &ReputationData,
        issued_at: i64,
    ) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(previous.map_or(&[0u8; 32], |p| p));
        hasher.update(subject.as_bytes());
        hasher.update(issuer.as_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.update(&data.score.to_le_bytes());
        hasher.update(&data.total_transactions.to_le_bytes());
        hasher.update(&data.positive_rating.to_le_bytes());
        hasher.update(&data.verified_sales.to_le_bytes());
        hasher.update(&data.account_age.to_le_bytes());
        hasher.update(&issued_at.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Returns true if this record's digest matches its contents and `previous`.
    #[must_use]
    pub fn verify_digest(&self) -> bool {
        let expected = Self::compute_digest(
            self.previous.as_ref(),
            &self.subject,
            &self.issuer,
            self.sequence,
            &self.data,
            self.issued_at,
        );
        self.digest == expected
    }
}

/// Append-only store of reputation attestations.
///
/// Serializes as the plain record list; deserializing re-verifies every chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<ReputationAttestation>",
    into = "Vec<ReputationAttestation>"
)]
pub struct AttestationLog {
    records: Vec<ReputationAttestation>,
    by_subject: HashMap<Address, Vec<usize>>,
}

impl TryFrom<Vec<ReputationAttestation>> for AttestationLog {
    type Error = ReputationError;

    fn try_from(records: Vec<ReputationAttestation>) -> Result<Self, Self::Error> {
        Self::from_records(records)
    }
}

impl From<AttestationLog> for Vec<ReputationAttestation> {
    fn from(log: AttestationLog) -> Self {
        log.records
    }
}

impl AttestationLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from stored records, verifying every subject's chain.
    ///
    /// # Errors
    ///
    /// Returns `ReputationError::ChainBroken` on the first inconsistent record.
    pub fn from_records(records: Vec<ReputationAttestation>) -> Result<Self, ReputationError> {
        let mut log = Self {
            records,
            by_subject: HashMap::new(),
        };
        log.reindex();
        let subjects: Vec<Address> = log.by_subject.keys().copied().collect();
        for subject in subjects {
            log.verify_chain(&subject)?;
        }
        Ok(log)
    }

    fn reindex(&mut self) {
        self.by_subject.clear();
        for (idx, record) in self.records.iter().enumerate() {
            self.by_subject.entry(record.subject).or_default().push(idx);
        }
    }

    /// Appends a new record for `subject`, chained to its latest one.
    pub fn append(
        &mut self,
        subject: Address,
        issuer: Address,
        data: ReputationData,
        issued_at: i64,
    ) -> &ReputationAttestation {
        let (sequence, previous) = match self.latest(&subject) {
            Some(prev) => (prev.sequence + 1, Some(prev.digest)),
            None => (0, None),
        };
        let digest = ReputationAttestation::compute_digest(
            previous.as_ref(),
            &subject,
            &issuer,
            sequence,
            &data,
            issued_at,
        );
        let idx = self.records.len();
        self.records.push(ReputationAttestation {
            id: Uuid::new_v4(),
            subject,
            issuer,
            sequence,
            data,
            issued_at,
            previous,
            digest,
        });
        self.by_subject.entry(subject).or_default().push(idx);
        &self.records[idx]
    }

    /// The current (most recent) record for `subject`.
    #[must_use]
    pub fn latest(&self, subject: &Address) -> Option<&ReputationAttestation> {
        self.by_subject
            .get(subject)
            .and_then(|indices| indices.last())
            .map(|&idx| &self.records[idx])
    }

    /// Every record for `subject`, oldest first.
    #[must_use]
    pub fn history(&self, subject: &Address) -> Vec<&ReputationAttestation> {
        self.by_subject
            .get(subject)
            .map(|indices| indices.iter().map(|&idx| &self.records[idx]).collect())
            .unwrap_or_default()
    }

    /// Checks sequence numbers, digests and links of `subject`'s history.
    ///
    /// # Errors
    ///
    /// Returns `ReputationError::ChainBroken` at the first bad record.
    pub fn verify_chain(&self, subject: &Address) -> Result<(), ReputationError> {
        let mut previous: Option<[u8; 32]> = None;
        for (expected_seq, record) in self.history(subject).into_iter().enumerate() {
            let expected_seq = expected_seq as u64;
            if record.sequence != expected_seq || record.previous != previous || !record.verify_digest() {
                return Err(ReputationError::ChainBroken {
                    subject: *subject,
                    sequence: expected_seq,
                });
            }
            previous = Some(record.digest);
        }
        Ok(())
    }

    /// All records in append order.
    #[must_use]
    pub fn records(&self) -> &[ReputationAttestation] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
