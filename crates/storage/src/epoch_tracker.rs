use std::collections::HashMap;
use std::sync::Arc;

use lambdaslash_types::{
    attestation::AttestedEpochForValidator,
    primitives::{Decode, Encode, Epoch, ValidatorIndex},
};
use tracing::debug;

use crate::api::{StorageBackend, StorageWriteBatch, Table};
use crate::error::Error;
use crate::keys::encode_validator_key;

/// Tracks the latest epoch each validator has a recorded vote for.
///
/// Stores whatever it is given: keeping the value monotonic is the caller's
/// job (see [`crate::SlasherDb::ingest`]).
#[derive(Clone)]
pub struct EpochTracker {
    backend: Arc<dyn StorageBackend>,
}

impl EpochTracker {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Looks up the latest epoch of each validator.
    ///
    /// Validators without an entry are left out of the map.
    pub fn latest_epoch(
        &self,
        validators: &[ValidatorIndex],
    ) -> Result<HashMap<ValidatorIndex, Epoch>, Error> {
        Ok(self
            .attested_epochs(validators)?
            .into_iter()
            .map(|attested| (attested.validator_index, attested.epoch))
            .collect())
    }

    /// Same lookup as [`Self::latest_epoch`], in input order.
    pub fn attested_epochs(
        &self,
        validators: &[ValidatorIndex],
    ) -> Result<Vec<AttestedEpochForValidator>, Error> {
        let keys: Vec<_> = validators.iter().copied().map(encode_validator_key).collect();

        let view = self.backend.begin_read()?;
        let stored = view.get_batch(Table::LatestEpoch, &keys)?;
        drop(view);

        validators
            .iter()
            .zip(stored)
            .filter_map(|(&validator_index, bytes)| {
                bytes.map(|bytes| {
                    Epoch::from_ssz_bytes(&bytes)
                        .map(|epoch| AttestedEpochForValidator {
                            validator_index,
                            epoch,
                        })
                        .map_err(|error| Error::Decode {
                            table: Table::LatestEpoch,
                            error,
                        })
                })
            })
            .collect()
    }

    /// Sets `epoch` as the latest epoch of every validator in one batch.
    pub fn save_latest_epoch(&self, validators: &[ValidatorIndex], epoch: Epoch) -> Result<(), Error> {
        let entries: Vec<_> = validators
            .iter()
            .map(|&validator_index| AttestedEpochForValidator {
                validator_index,
                epoch,
            })
            .collect();

        let mut write = self.backend.begin_write()?;
        self.stage_latest_epochs(&mut *write, &entries)?;
        write.commit()?;

        debug!(validators = validators.len(), epoch, "Saved latest attested epochs");
        Ok(())
    }

    /// Stages latest-epoch entries into a caller-owned write batch.
    pub fn stage_latest_epochs(
        &self,
        write: &mut dyn StorageWriteBatch,
        entries: &[AttestedEpochForValidator],
    ) -> Result<(), Error> {
        if entries.is_empty() {
            return Ok(());
        }
        let entries = entries
            .iter()
            .map(|entry| {
                (
                    encode_validator_key(entry.validator_index),
                    entry.epoch.as_ssz_bytes(),
                )
            })
            .collect();
        write.put_batch(Table::LatestEpoch, entries)?;
        Ok(())
    }
}
