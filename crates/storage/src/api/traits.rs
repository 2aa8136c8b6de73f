use super::Table;

/// Storage error type.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Result type for prefix iterator operations.
pub type PrefixResult = Result<(Box<[u8]>, Box<[u8]>), Error>;

/// A storage backend that can create read views and write batches.
///
/// Backends are shared between components and callers on different threads.
pub trait StorageBackend: Send + Sync {
    /// Begin a read-only transaction.
    ///
    /// Everything read through one view reflects a single point in time: a
    /// concurrently committed batch is either fully visible or not at all.
    fn begin_read(&self) -> Result<Box<dyn StorageReadView + '_>, Error>;

    /// Begin a write batch.
    fn begin_write(&self) -> Result<Box<dyn StorageWriteBatch + 'static>, Error>;
}

/// A read-only view of the storage.
pub trait StorageReadView {
    /// Get a value by key from a table.
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Get several values from a table at once.
    ///
    /// The result has one entry per key, in the order the keys were given.
    fn get_batch(&self, table: Table, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, Error> {
        keys.iter().map(|key| self.get(table, key)).collect()
    }

    /// Iterate over all entries with a given key prefix, in ascending key order.
    fn prefix_iterator(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Box<dyn Iterator<Item = PrefixResult> + '_>, Error>;
}

/// A write batch that can be committed atomically.
///
/// Operations are applied in the order they were staged.
pub trait StorageWriteBatch: Send {
    /// Put multiple key-value pairs into a table.
    fn put_batch(&mut self, table: Table, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), Error>;

    /// Delete multiple keys from a table.
    fn delete_batch(&mut self, table: Table, keys: Vec<Vec<u8>>) -> Result<(), Error>;

    /// Commit the batch, consuming it.
    ///
    /// Either every staged operation becomes visible or none does.
    fn commit(self: Box<Self>) -> Result<(), Error>;
}
