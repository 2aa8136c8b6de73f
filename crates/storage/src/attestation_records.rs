use std::sync::Arc;

use lambdaslash_types::{
    ShortRoot,
    attestation::{AttestationRecord, AttesterDoubleVote, CompactAttestation},
    primitives::{Decode, Encode, Epoch, ValidatorIndex},
};
use tracing::{debug, trace, warn};

use crate::api::{StorageBackend, StorageWriteBatch, Table};
use crate::error::Error;
use crate::keys::{decode_record_key, encode_record_key, record_key_prefix};
use crate::metrics;

fn decode_record(bytes: &[u8]) -> Result<AttestationRecord, Error> {
    AttestationRecord::from_ssz_bytes(bytes).map_err(|error| Error::Decode {
        table: Table::AttestationRecords,
        error,
    })
}

/// Every `(validator, target)` pair named by a batch, in visiting order:
/// attestation order first, then attesting index order.
fn visit_pairs(
    batch: &[CompactAttestation],
) -> impl Iterator<Item = (ValidatorIndex, &CompactAttestation)> {
    batch.iter().flat_map(|attestation| {
        attestation
            .attesting_indices
            .iter()
            .map(move |&validator| (validator, attestation))
    })
}

/// Durable store of one [`AttestationRecord`] per `(validator, target_epoch)`.
///
/// Double votes are detected by comparing incoming attestations against the
/// records already committed to the backend.
#[derive(Clone)]
pub struct AttestationRecordStore {
    backend: Arc<dyn StorageBackend>,
}

impl AttestationRecordStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Returns the record a validator has for `target`, if any.
    pub fn get_record(
        &self,
        validator: ValidatorIndex,
        target: Epoch,
    ) -> Result<Option<AttestationRecord>, Error> {
        let view = self.backend.begin_read()?;
        view.get(Table::AttestationRecords, &encode_record_key(validator, target))?
            .map(|bytes| decode_record(&bytes))
            .transpose()
    }

    /// Returns every record of a validator, ordered by target epoch.
    pub fn records_for_validator(
        &self,
        validator: ValidatorIndex,
    ) -> Result<Vec<AttestationRecord>, Error> {
        let view = self.backend.begin_read()?;
        let records =
            view.prefix_iterator(Table::AttestationRecords, &record_key_prefix(validator))?;
        records
            .map(|res| {
                let (_, value) = res?;
                decode_record(&value)
            })
            .collect()
    }

    /// Writes a record for every attesting validator of every attestation.
    ///
    /// The whole batch is committed at once: on error nothing was written.
    pub fn save_records(&self, batch: &[CompactAttestation]) -> Result<(), Error> {
        let mut write = self.backend.begin_write()?;
        let written = self.stage_records(&mut *write, batch)?;
        write.commit()?;

        metrics::inc_records_written(written as u64);
        debug!(
            attestations = batch.len(),
            records = written,
            "Saved attestation records"
        );
        Ok(())
    }

    /// Stages the records of `batch` into a caller-owned write batch,
    /// returning the number of records staged.
    pub fn stage_records(
        &self,
        write: &mut dyn StorageWriteBatch,
        batch: &[CompactAttestation],
    ) -> Result<usize, Error> {
        let entries: Vec<_> = visit_pairs(batch)
            .map(|(validator, attestation)| {
                (
                    encode_record_key(validator, attestation.target),
                    attestation.to_record().as_ssz_bytes(),
                )
            })
            .collect();
        let staged = entries.len();

        if staged > 0 {
            write.put_batch(Table::AttestationRecords, entries)?;
        }
        Ok(staged)
    }

    /// Checks a batch against committed records, without writing anything.
    ///
    /// Records staged by earlier attestations of the same batch are not
    /// consulted. The result lists double votes in the order the
    /// `(validator, target)` pairs were visited.
    ///
    /// Being a pure query, a check does not count towards the double votes
    /// metric; [`crate::SlasherDb::ingest`] does.
    pub fn check_double_votes(
        &self,
        batch: &[CompactAttestation],
    ) -> Result<Vec<AttesterDoubleVote>, Error> {
        let _timing = metrics::time_double_vote_check();

        let pairs: Vec<_> = visit_pairs(batch).collect();
        let keys: Vec<_> = pairs
            .iter()
            .map(|(validator, attestation)| encode_record_key(*validator, attestation.target))
            .collect();

        let view = self.backend.begin_read()?;
        let stored = view.get_batch(Table::AttestationRecords, &keys)?;
        drop(view);

        let mut double_votes = Vec::new();
        for ((validator, attestation), bytes) in pairs.into_iter().zip(stored) {
            let Some(bytes) = bytes else {
                continue;
            };
            let existing = decode_record(&bytes)?;
            if existing.signing_root == attestation.signing_root {
                trace!(validator, target = attestation.target, "Repeated attestation");
                continue;
            }

            warn!(
                validator,
                target = attestation.target,
                signing_root = %ShortRoot(&attestation.signing_root.0),
                prev_signing_root = %ShortRoot(&existing.signing_root.0),
                "Attester double vote detected"
            );
            double_votes.push(AttesterDoubleVote {
                validator_index: validator,
                signing_root: attestation.signing_root,
                prev_signing_root: existing.signing_root,
                target: attestation.target,
            });
        }

        Ok(double_votes)
    }

    /// Deletes every record whose target epoch is below `epoch`, returning
    /// how many were removed.
    ///
    /// Nothing calls this implicitly; retention is up to the caller.
    pub fn prune_records_before(&self, epoch: Epoch) -> Result<usize, Error> {
        let view = self.backend.begin_read()?;
        let mut stale = Vec::new();
        for res in view.prefix_iterator(Table::AttestationRecords, &[])? {
            let (key, _) = res?;
            let (_, target) = decode_record_key(&key)?;
            if target < epoch {
                stale.push(key.into_vec());
            }
        }
        drop(view);

        let pruned = stale.len();
        if pruned == 0 {
            return Ok(0);
        }

        let mut write = self.backend.begin_write()?;
        write.delete_batch(Table::AttestationRecords, stale)?;
        write.commit()?;

        metrics::inc_records_pruned(pruned as u64);
        debug!(epoch, pruned, "Pruned attestation records");
        Ok(pruned)
    }
}
