//! Slasher database: attestation records with double vote detection, latest
//! attested epochs, and span chunk storage for surround vote detection.

mod api;
mod attestation_records;
pub mod backend;
mod chunks;
mod config;
mod epoch_tracker;
mod error;
pub mod keys;
mod metrics;
mod slasher_db;
#[cfg(test)]
mod test_utils;

pub use api::{
    ALL_TABLES, Error as BackendError, PrefixResult, StorageBackend, StorageReadView,
    StorageWriteBatch, Table,
};
pub use attestation_records::AttestationRecordStore;
pub use chunks::{ChunkStore, chunk_table};
pub use config::{BackendConfig, ConfigError, DEFAULT_ELEMS_PER_CHUNK, SlasherDbConfig};
pub use epoch_tracker::EpochTracker;
pub use error::Error;
pub use slasher_db::SlasherDb;
