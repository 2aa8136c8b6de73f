//! RocksDB storage backend.

use crate::api::{
    ALL_TABLES, Error, PrefixResult, StorageBackend, StorageReadView, StorageWriteBatch, Table,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, ReadOptions, SnapshotWithThreadMode, WriteBatch, WriteOptions,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type DB = DBWithThreadMode<MultiThreaded>;

/// Returns the column family handle for a table.
fn cf_handle(db: &DB, table: Table) -> Result<Arc<BoundColumnFamily<'_>>, Error> {
    db.cf_handle(table.name())
        .ok_or_else(|| format!("Column family {} not found", table.name()).into())
}

/// RocksDB storage backend.
///
/// Every [`Table`] lives in its own column family named after [`Table::name`].
#[derive(Clone)]
pub struct RocksDBBackend {
    db: Arc<DB>,
}

impl RocksDBBackend {
    /// Open a RocksDB database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = ALL_TABLES
            .iter()
            .map(|t| ColumnFamilyDescriptor::new(t.name(), Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)?;
        info!(path = %path.as_ref().display(), "Opened slasher database");

        Ok(Self { db: Arc::new(db) })
    }
}

impl StorageBackend for RocksDBBackend {
    fn begin_read(&self) -> Result<Box<dyn StorageReadView + '_>, Error> {
        Ok(Box::new(RocksDBReadView {
            db: &self.db,
            snapshot: self.db.snapshot(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn StorageWriteBatch + 'static>, Error> {
        Ok(Box::new(RocksDBWriteBatch {
            db: Arc::clone(&self.db),
            batch: WriteBatch::default(),
        }))
    }
}

/// Read-only view into RocksDB, pinned to a snapshot taken when it was opened.
struct RocksDBReadView<'a> {
    db: &'a DB,
    snapshot: SnapshotWithThreadMode<'a, DB>,
}

impl StorageReadView for RocksDBReadView<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let cf = cf_handle(self.db, table)?;
        Ok(self.snapshot.get_cf(&cf, key)?)
    }

    fn get_batch(&self, table: Table, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, Error> {
        let cf = cf_handle(self.db, table)?;
        let mut read_opts = ReadOptions::default();
        read_opts.set_snapshot(&self.snapshot);

        self.db
            .multi_get_cf_opt(keys.iter().map(|key| (&cf, key)), &read_opts)
            .into_iter()
            .map(|result| result.map_err(|e| Box::new(e) as Error))
            .collect()
    }

    fn prefix_iterator(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Box<dyn Iterator<Item = PrefixResult> + '_>, Error> {
        let cf = cf_handle(self.db, table)?;

        let prefix_owned = prefix.to_vec();
        let iter = self
            .snapshot
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward))
            .map(|result| result.map_err(|e| Box::new(e) as Error))
            .take_while(move |result| match result {
                Ok((key, _)) => key.starts_with(&prefix_owned),
                Err(_) => true, // propagate errors
            });

        Ok(Box::new(iter))
    }
}

/// Write batch for RocksDB.
struct RocksDBWriteBatch {
    db: Arc<DB>,
    batch: WriteBatch,
}

impl StorageWriteBatch for RocksDBWriteBatch {
    fn put_batch(&mut self, table: Table, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), Error> {
        let cf = cf_handle(&self.db, table)?;

        for (key, value) in batch {
            self.batch.put_cf(&cf, key, value);
        }
        Ok(())
    }

    fn delete_batch(&mut self, table: Table, keys: Vec<Vec<u8>>) -> Result<(), Error> {
        let cf = cf_handle(&self.db, table)?;

        for key in keys {
            self.batch.delete_cf(&cf, key);
        }
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), Error> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);

        self.db.write_opt(self.batch, &write_opts)?;
        Ok(())
    }
}
