use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::api::{Error, PrefixResult, StorageBackend, StorageReadView, StorageWriteBatch, Table};

type TableData = BTreeMap<Vec<u8>, Vec<u8>>;
type StorageData = HashMap<Table, TableData>;

/// A staged write, applied in staging order on commit.
enum Op {
    Put(Table, Vec<u8>, Vec<u8>),
    Delete(Table, Vec<u8>),
}

/// In-memory storage backend using ordered maps.
///
/// Suitable for tests and ephemeral nodes. Data is lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<StorageData>>,
}

impl InMemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn begin_read(&self) -> Result<Box<dyn StorageReadView + '_>, Error> {
        let guard = self.data.read().map_err(|e| e.to_string())?;
        Ok(Box::new(InMemoryReadView { guard }))
    }

    fn begin_write(&self) -> Result<Box<dyn StorageWriteBatch + 'static>, Error> {
        Ok(Box::new(InMemoryWriteBatch {
            data: Arc::clone(&self.data),
            ops: Vec::new(),
        }))
    }
}

/// Read view holding a read lock on the storage data.
///
/// Commits wait for the lock, so the view never observes a partial batch.
struct InMemoryReadView<'a> {
    guard: std::sync::RwLockReadGuard<'a, StorageData>,
}

impl StorageReadView for InMemoryReadView<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.guard.get(&table).and_then(|t| t.get(key)).cloned())
    }

    fn prefix_iterator(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Box<dyn Iterator<Item = PrefixResult> + '_>, Error> {
        let table_data = self.guard.get(&table);
        let prefix_owned = prefix.to_vec();

        let iter: Box<dyn Iterator<Item = PrefixResult> + '_> = match table_data {
            Some(data) => Box::new(
                data.range(prefix.to_vec()..)
                    .take_while(move |(k, _)| k.starts_with(&prefix_owned))
                    .map(|(k, v)| Ok((k.clone().into_boxed_slice(), v.clone().into_boxed_slice()))),
            ),
            None => Box::new(std::iter::empty()),
        };

        Ok(iter)
    }
}

/// Write batch that accumulates changes before committing.
struct InMemoryWriteBatch {
    data: Arc<RwLock<StorageData>>,
    ops: Vec<Op>,
}

impl StorageWriteBatch for InMemoryWriteBatch {
    fn put_batch(&mut self, table: Table, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), Error> {
        self.ops
            .extend(batch.into_iter().map(|(k, v)| Op::Put(table, k, v)));
        Ok(())
    }

    fn delete_batch(&mut self, table: Table, keys: Vec<Vec<u8>>) -> Result<(), Error> {
        self.ops
            .extend(keys.into_iter().map(|k| Op::Delete(table, k)));
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), Error> {
        let mut guard = self.data.write().map_err(|e| e.to_string())?;

        for op in self.ops {
            match op {
                Op::Put(table, key, value) => {
                    guard.entry(table).or_default().insert(key, value);
                }
                Op::Delete(table, key) => {
                    if let Some(table_data) = guard.get_mut(&table) {
                        table_data.remove(&key);
                    }
                }
            }
        }

        Ok(())
    }
}
