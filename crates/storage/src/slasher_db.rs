use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use lambdaslash_types::{
    attestation::{AttestedEpochForValidator, AttesterDoubleVote, CompactAttestation},
    primitives::{Epoch, ValidatorIndex},
};
use tracing::{debug, info};

use crate::api::StorageBackend;
use crate::attestation_records::AttestationRecordStore;
use crate::chunks::ChunkStore;
use crate::config::{ConfigError, SlasherDbConfig};
use crate::epoch_tracker::EpochTracker;
use crate::error::Error;
use crate::metrics;

/// The slasher database: attestation records, latest attested epochs and
/// span chunks, all on one shared backend.
///
/// Clones share the backend and the ingest lock.
#[derive(Clone)]
pub struct SlasherDb {
    backend: Arc<dyn StorageBackend>,
    records: AttestationRecordStore,
    epochs: EpochTracker,
    chunks: ChunkStore,
    ingest_lock: Arc<Mutex<()>>,
}

impl SlasherDb {
    /// Fails with [`Error::ZeroElemsPerChunk`] when `elems_per_chunk` is zero.
    pub fn new(backend: Arc<dyn StorageBackend>, elems_per_chunk: usize) -> Result<Self, Error> {
        Ok(Self {
            records: AttestationRecordStore::new(Arc::clone(&backend)),
            epochs: EpochTracker::new(Arc::clone(&backend)),
            chunks: ChunkStore::new(Arc::clone(&backend), elems_per_chunk)?,
            backend,
            ingest_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Opens the backend described by `config`.
    pub fn open(config: &SlasherDbConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let backend = config.open_backend()?;
        info!(
            backend = ?config.backend,
            elems_per_chunk = config.elems_per_chunk,
            "Initialized slasher database"
        );
        Ok(Self::new(backend, config.elems_per_chunk)?)
    }

    pub fn records(&self) -> &AttestationRecordStore {
        &self.records
    }

    pub fn epochs(&self) -> &EpochTracker {
        &self.epochs
    }

    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    /// Checks a batch for double votes, then stores it.
    ///
    /// The check runs against previously committed state. The records and the
    /// latest-epoch updates go out in a single write batch; a validator's
    /// latest epoch only ever moves forward here.
    ///
    /// Ingests through this handle and its clones run one at a time, from the
    /// check to the commit. Writes made directly through [`Self::records`] or
    /// [`Self::epochs`], or through another `SlasherDb` on the same backend,
    /// are not covered by that lock.
    ///
    /// Detected double votes are counted in the
    /// `slasher_attester_double_votes_total` metric.
    pub fn ingest(&self, batch: &[CompactAttestation]) -> Result<Vec<AttesterDoubleVote>, Error> {
        // Guards no data, so a panicked holder leaves nothing to repair.
        let _guard = self
            .ingest_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let double_votes = self.records.check_double_votes(batch)?;

        let mut batch_latest: BTreeMap<ValidatorIndex, Epoch> = BTreeMap::new();
        for attestation in batch {
            for &validator in &attestation.attesting_indices {
                batch_latest
                    .entry(validator)
                    .and_modify(|epoch| *epoch = (*epoch).max(attestation.target))
                    .or_insert(attestation.target);
            }
        }

        let validators: Vec<_> = batch_latest.keys().copied().collect();
        let stored = self.epochs.latest_epoch(&validators)?;
        let advanced: Vec<_> = batch_latest
            .into_iter()
            .filter(|(validator, epoch)| stored.get(validator).is_none_or(|known| epoch > known))
            .map(|(validator_index, epoch)| AttestedEpochForValidator {
                validator_index,
                epoch,
            })
            .collect();

        let mut write = self.backend.begin_write()?;
        let written = self.records.stage_records(&mut *write, batch)?;
        self.epochs.stage_latest_epochs(&mut *write, &advanced)?;
        write.commit()?;

        metrics::inc_records_written(written as u64);
        metrics::inc_double_votes(double_votes.len() as u64);
        debug!(
            attestations = batch.len(),
            records = written,
            advanced_epochs = advanced.len(),
            double_votes = double_votes.len(),
            "Ingested attestation batch"
        );
        Ok(double_votes)
    }
}
