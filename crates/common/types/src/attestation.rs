use ssz_derive::{Decode, Encode};

use crate::primitives::{Epoch, H256, ValidatorIndex};

/// An attestation reduced to the fields needed for slashing detection.
///
/// Built by the caller for each incoming attestation and never stored as-is:
/// it fans out into one [`AttestationRecord`] per attesting validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactAttestation {
    /// Validators that signed the attestation, in the order they were given.
    pub attesting_indices: Vec<ValidatorIndex>,

    /// The source epoch of the vote.
    pub source: Epoch,

    /// The target epoch of the vote.
    pub target: Epoch,

    /// Root the validators signed over.
    pub signing_root: H256,
}

impl CompactAttestation {
    /// Returns the record each attesting validator gets for this attestation.
    pub fn to_record(&self) -> AttestationRecord {
        AttestationRecord {
            target: self.target,
            source: self.source,
            signing_root: self.signing_root,
        }
    }
}

/// Vote persisted per `(validator_index, target_epoch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct AttestationRecord {
    pub target: Epoch,
    pub source: Epoch,
    pub signing_root: H256,
}

/// Latest target epoch a validator has a record for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestedEpochForValidator {
    pub validator_index: ValidatorIndex,
    pub epoch: Epoch,
}

/// Evidence that a validator signed two different attestations for the same
/// target epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttesterDoubleVote {
    pub validator_index: ValidatorIndex,
    /// Root of the attestation that was just seen.
    pub signing_root: H256,
    /// Root of the attestation already on record.
    pub prev_signing_root: H256,
    pub target: Epoch,
}
