//! Backends with injected failures.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::api::{Error, StorageBackend, StorageReadView, StorageWriteBatch, Table};
use crate::backend::InMemoryBackend;

/// In-memory backend whose commits can be made to fail on demand.
#[derive(Default)]
pub struct FailingCommitBackend {
    inner: InMemoryBackend,
    fail: Arc<AtomicBool>,
}

impl FailingCommitBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for FailingCommitBackend {
    fn begin_read(&self) -> Result<Box<dyn StorageReadView + '_>, Error> {
        self.inner.begin_read()
    }

    fn begin_write(&self) -> Result<Box<dyn StorageWriteBatch + 'static>, Error> {
        Ok(Box::new(FailingWriteBatch {
            inner: self.inner.begin_write()?,
            fail: Arc::clone(&self.fail),
        }))
    }
}

struct FailingWriteBatch {
    inner: Box<dyn StorageWriteBatch>,
    fail: Arc<AtomicBool>,
}

impl StorageWriteBatch for FailingWriteBatch {
    fn put_batch(&mut self, table: Table, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), Error> {
        self.inner.put_batch(table, batch)
    }

    fn delete_batch(&mut self, table: Table, keys: Vec<Vec<u8>>) -> Result<(), Error> {
        self.inner.delete_batch(table, keys)
    }

    fn commit(self: Box<Self>) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("injected commit failure".into());
        }
        self.inner.commit()
    }
}

thread_local! {
    static COMMIT_DELAY: Cell<Duration> = const { Cell::new(Duration::ZERO) };
}

/// In-memory backend that lines up the first two writers.
///
/// `begin_write` blocks until a second writer has also called it, or until
/// `wait` elapses. Commits sleep for the delay set on the committing thread.
pub struct RendezvousBackend {
    inner: InMemoryBackend,
    writers: Mutex<usize>,
    arrived: Condvar,
    wait: Duration,
}

impl RendezvousBackend {
    pub fn new(wait: Duration) -> Self {
        Self {
            inner: InMemoryBackend::new(),
            writers: Mutex::new(0),
            arrived: Condvar::new(),
            wait,
        }
    }

    /// Delays every commit issued from the calling thread.
    pub fn delay_commits_on_current_thread(delay: Duration) {
        COMMIT_DELAY.with(|cell| cell.set(delay));
    }
}

impl StorageBackend for RendezvousBackend {
    fn begin_read(&self) -> Result<Box<dyn StorageReadView + '_>, Error> {
        self.inner.begin_read()
    }

    fn begin_write(&self) -> Result<Box<dyn StorageWriteBatch + 'static>, Error> {
        let deadline = Instant::now() + self.wait;
        let mut writers = self.writers.lock().map_err(|e| e.to_string())?;
        *writers += 1;
        self.arrived.notify_all();
        while *writers < 2 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            writers = self
                .arrived
                .wait_timeout(writers, remaining)
                .map_err(|e| e.to_string())?
                .0;
        }
        drop(writers);

        Ok(Box::new(DelayedWriteBatch {
            inner: self.inner.begin_write()?,
        }))
    }
}

struct DelayedWriteBatch {
    inner: Box<dyn StorageWriteBatch>,
}

impl StorageWriteBatch for DelayedWriteBatch {
    fn put_batch(&mut self, table: Table, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), Error> {
        self.inner.put_batch(table, batch)
    }

    fn delete_batch(&mut self, table: Table, keys: Vec<Vec<u8>>) -> Result<(), Error> {
        self.inner.delete_batch(table, keys)
    }

    fn commit(self: Box<Self>) -> Result<(), Error> {
        thread::sleep(COMMIT_DELAY.with(Cell::get));
        self.inner.commit()
    }
}
