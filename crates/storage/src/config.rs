use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::api::StorageBackend;
use crate::backend::InMemoryBackend;

/// Number of span values per chunk when the config does not say otherwise.
pub const DEFAULT_ELEMS_PER_CHUNK: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("elems_per_chunk must be greater than zero")]
    ZeroElemsPerChunk,
    #[error("failed to open backend: {0}")]
    Backend(#[source] crate::api::Error),
    #[error("failed to build slasher database: {0}")]
    Store(#[from] crate::error::Error),
    #[error("RocksDB backend requested but the `rocksdb` feature is disabled")]
    RocksDBUnavailable,
}

/// Which storage backend the slasher database runs on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendConfig {
    InMemory,
    RocksDb { path: PathBuf },
}

/// Configuration of the slasher database.
///
/// ```json
/// { "backend": { "rocks_db": { "path": "/data/slasher" } }, "elems_per_chunk": 16 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlasherDbConfig {
    pub backend: BackendConfig,
    /// Length of every chunk stored by the `ChunkStore`. Set by the
    /// surround-vote detector.
    #[serde(default = "default_elems_per_chunk")]
    pub elems_per_chunk: usize,
}

fn default_elems_per_chunk() -> usize {
    DEFAULT_ELEMS_PER_CHUNK
}

impl Default for SlasherDbConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::InMemory,
            elems_per_chunk: DEFAULT_ELEMS_PER_CHUNK,
        }
    }
}

impl SlasherDbConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.elems_per_chunk == 0 {
            return Err(ConfigError::ZeroElemsPerChunk);
        }
        Ok(())
    }

    /// Open the configured backend.
    pub fn open_backend(&self) -> Result<Arc<dyn StorageBackend>, ConfigError> {
        match &self.backend {
            BackendConfig::InMemory => Ok(Arc::new(InMemoryBackend::new())),
            #[cfg(feature = "rocksdb")]
            BackendConfig::RocksDb { path } => {
                let backend =
                    crate::backend::RocksDBBackend::open(path).map_err(ConfigError::Backend)?;
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "rocksdb"))]
            BackendConfig::RocksDb { .. } => Err(ConfigError::RocksDBUnavailable),
        }
    }
}
