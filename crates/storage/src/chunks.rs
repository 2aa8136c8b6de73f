use std::sync::Arc;

use lambdaslash_types::span::{Chunk, SpanKind};
use tracing::{debug, trace};

use crate::api::{StorageBackend, Table};
use crate::error::Error;
use crate::keys::encode_chunk_key;
use crate::metrics;

/// Table holding the chunks of a span kind.
pub fn chunk_table(kind: SpanKind) -> Table {
    match kind {
        SpanKind::MinSpan => Table::MinSpanChunks,
        SpanKind::MaxSpan => Table::MaxSpanChunks,
    }
}

/// Persistent storage of fixed-length span chunks.
///
/// The store knows nothing about how spans are computed: `SpanKind` only
/// selects a partition and chunk keys are opaque.
#[derive(Clone)]
pub struct ChunkStore {
    backend: Arc<dyn StorageBackend>,
    elems_per_chunk: usize,
}

impl ChunkStore {
    /// Fails with [`Error::ZeroElemsPerChunk`] when `elems_per_chunk` is zero.
    pub fn new(backend: Arc<dyn StorageBackend>, elems_per_chunk: usize) -> Result<Self, Error> {
        if elems_per_chunk == 0 {
            return Err(Error::ZeroElemsPerChunk);
        }
        Ok(Self {
            backend,
            elems_per_chunk,
        })
    }

    pub fn elems_per_chunk(&self) -> usize {
        self.elems_per_chunk
    }

    /// Replaces the chunk at each `(kind, keys[i])` with `chunks[i]`.
    ///
    /// Input is validated before anything is staged, so a rejected call leaves
    /// the stored chunks untouched.
    pub fn save_chunks(&self, kind: SpanKind, keys: &[u64], chunks: &[Chunk]) -> Result<(), Error> {
        if keys.len() != chunks.len() {
            return Err(Error::ChunkCountMismatch {
                keys: keys.len(),
                chunks: chunks.len(),
            });
        }
        if let Some((&key, chunk)) = keys
            .iter()
            .zip(chunks)
            .find(|(_, chunk)| chunk.len() != self.elems_per_chunk)
        {
            return Err(Error::ChunkLengthMismatch {
                key,
                len: chunk.len(),
                expected: self.elems_per_chunk,
            });
        }
        if keys.is_empty() {
            return Ok(());
        }

        let _timing = metrics::time_chunk_io(kind.as_str(), "save");
        let entries = keys
            .iter()
            .zip(chunks)
            .map(|(&key, chunk)| (encode_chunk_key(key), chunk.to_bytes()))
            .collect();

        let mut write = self.backend.begin_write()?;
        write.put_batch(chunk_table(kind), entries)?;
        write.commit()?;

        metrics::inc_chunks_saved(kind.as_str(), keys.len() as u64);
        debug!(%kind, chunks = keys.len(), "Saved slasher chunks");
        Ok(())
    }

    /// Loads the chunks at `(kind, keys[i])`.
    ///
    /// Returns the chunks, `None` where nothing is stored, together with a
    /// flag per key telling whether a chunk existed. Both follow input order.
    pub fn load_chunks(
        &self,
        kind: SpanKind,
        keys: &[u64],
    ) -> Result<(Vec<Option<Chunk>>, Vec<bool>), Error> {
        let _timing = metrics::time_chunk_io(kind.as_str(), "load");
        let table = chunk_table(kind);
        let encoded: Vec<_> = keys.iter().copied().map(encode_chunk_key).collect();

        let view = self.backend.begin_read()?;
        let stored = view.get_batch(table, &encoded)?;
        drop(view);

        let chunks = stored
            .into_iter()
            .map(|bytes| {
                bytes
                    .map(|bytes| Chunk::from_bytes(&bytes))
                    .transpose()
                    .map_err(|error| Error::Decode { table, error })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let existed: Vec<_> = chunks.iter().map(Option::is_some).collect();

        let found = existed.iter().filter(|exists| **exists).count();
        metrics::inc_chunks_loaded(kind.as_str(), found as u64);
        trace!(%kind, requested = keys.len(), found, "Loaded slasher chunks");

        Ok((chunks, existed))
    }

    /// Removes the chunks at `(kind, keys[i])`. Missing keys are ignored.
    pub fn delete_chunks(&self, kind: SpanKind, keys: &[u64]) -> Result<(), Error> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut write = self.backend.begin_write()?;
        write.delete_batch(
            chunk_table(kind),
            keys.iter().copied().map(encode_chunk_key).collect(),
        )?;
        write.commit()?;

        debug!(%kind, chunks = keys.len(), "Deleted slasher chunks");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::test_utils::FailingCommitBackend;

    const ELEMS_PER_CHUNK: usize = 16;
    const TOTAL_CHUNKS: u64 = 64;

    fn store() -> ChunkStore {
        ChunkStore::new(Arc::new(InMemoryBackend::new()), ELEMS_PER_CHUNK).unwrap()
    }

    fn keys_and_chunks() -> (Vec<u64>, Vec<Chunk>) {
        let keys: Vec<_> = (0..TOTAL_CHUNKS).collect();
        let chunks = keys
            .iter()
            .map(|&key| {
                let data = (0..ELEMS_PER_CHUNK as u16).map(|i| i * key as u16).collect();
                Chunk::new(data)
            })
            .collect();
        (keys, chunks)
    }

    #[test]
    fn span_kinds_are_independent() {
        let store = store();
        let (keys, chunks) = keys_and_chunks();

        store.save_chunks(SpanKind::MinSpan, &keys, &chunks).unwrap();

        let (loaded, existed) = store.load_chunks(SpanKind::MaxSpan, &keys).unwrap();
        assert_eq!(existed.len(), keys.len());
        assert!(existed.iter().all(|exists| !exists));
        assert!(loaded.iter().all(Option::is_none));

        let (loaded, existed) = store.load_chunks(SpanKind::MinSpan, &keys).unwrap();
        assert!(existed.iter().all(|exists| *exists));
        let loaded: Vec<_> = loaded.into_iter().map(Option::unwrap).collect();
        assert_eq!(loaded, chunks);

        store.save_chunks(SpanKind::MaxSpan, &keys, &chunks).unwrap();
        let (loaded, existed) = store.load_chunks(SpanKind::MaxSpan, &keys).unwrap();
        assert!(existed.iter().all(|exists| *exists));
        assert_eq!(loaded.into_iter().map(Option::unwrap).collect::<Vec<_>>(), chunks);
    }

    #[test]
    fn zeroed_chunk_is_distinct_from_missing() {
        let store = store();
        store
            .save_chunks(SpanKind::MinSpan, &[3], &[Chunk::zeroed(ELEMS_PER_CHUNK)])
            .unwrap();

        let (loaded, existed) = store.load_chunks(SpanKind::MinSpan, &[2, 3]).unwrap();
        assert_eq!(existed, vec![false, true]);
        assert_eq!(loaded, vec![None, Some(Chunk::zeroed(ELEMS_PER_CHUNK))]);
    }

    #[test]
    fn load_follows_input_order() {
        let store = store();
        let (keys, chunks) = keys_and_chunks();
        store.save_chunks(SpanKind::MaxSpan, &keys, &chunks).unwrap();

        let (loaded, _) = store.load_chunks(SpanKind::MaxSpan, &[9, 1, 100, 5]).unwrap();
        assert_eq!(
            loaded,
            vec![
                Some(chunks[9].clone()),
                Some(chunks[1].clone()),
                None,
                Some(chunks[5].clone()),
            ]
        );
    }

    #[test]
    fn save_replaces_whole_chunk() {
        let store = store();
        let mut chunk = Chunk::zeroed(ELEMS_PER_CHUNK);
        chunk.set(0, 11);
        store.save_chunks(SpanKind::MinSpan, &[0], &[chunk]).unwrap();

        let mut replacement = Chunk::zeroed(ELEMS_PER_CHUNK);
        replacement.set(15, 22);
        store
            .save_chunks(SpanKind::MinSpan, &[0], &[replacement.clone()])
            .unwrap();

        let (loaded, _) = store.load_chunks(SpanKind::MinSpan, &[0]).unwrap();
        assert_eq!(loaded, vec![Some(replacement)]);
    }

    #[test]
    fn mismatched_lengths_leave_chunks_unchanged() {
        let store = store();
        let (keys, chunks) = keys_and_chunks();
        store.save_chunks(SpanKind::MinSpan, &keys[..2], &chunks[..2]).unwrap();

        let replacements = vec![Chunk::zeroed(ELEMS_PER_CHUNK); 3];
        let err = store
            .save_chunks(SpanKind::MinSpan, &keys[..2], &replacements)
            .unwrap_err();
        assert!(matches!(err, Error::ChunkCountMismatch { keys: 2, chunks: 3 }));
        assert!(err.is_input_shape());

        let (loaded, _) = store.load_chunks(SpanKind::MinSpan, &keys[..3]).unwrap();
        assert_eq!(
            loaded,
            vec![Some(chunks[0].clone()), Some(chunks[1].clone()), None]
        );
    }

    #[test]
    fn wrong_chunk_length_is_rejected_before_writing() {
        let store = store();
        let err = store
            .save_chunks(
                SpanKind::MaxSpan,
                &[0, 1],
                &[Chunk::zeroed(ELEMS_PER_CHUNK), Chunk::zeroed(3)],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChunkLengthMismatch {
                key: 1,
                len: 3,
                expected: ELEMS_PER_CHUNK
            }
        ));

        let (_, existed) = store.load_chunks(SpanKind::MaxSpan, &[0, 1]).unwrap();
        assert_eq!(existed, vec![false, false]);
    }

    #[test]
    fn delete_removes_only_requested_kind() {
        let store = store();
        let (keys, chunks) = keys_and_chunks();
        store.save_chunks(SpanKind::MinSpan, &keys[..4], &chunks[..4]).unwrap();
        store.save_chunks(SpanKind::MaxSpan, &keys[..4], &chunks[..4]).unwrap();

        store.delete_chunks(SpanKind::MinSpan, &[1, 2]).unwrap();

        let (_, existed) = store.load_chunks(SpanKind::MinSpan, &keys[..4]).unwrap();
        assert_eq!(existed, vec![true, false, false, true]);
        let (_, existed) = store.load_chunks(SpanKind::MaxSpan, &keys[..4]).unwrap();
        assert_eq!(existed, vec![true; 4]);
    }

    #[test]
    fn failed_commit_leaves_chunks_untouched() {
        let backend = Arc::new(FailingCommitBackend::new());
        let store = ChunkStore::new(backend.clone(), ELEMS_PER_CHUNK).unwrap();
        let (keys, chunks) = keys_and_chunks();
        store.save_chunks(SpanKind::MinSpan, &keys[..2], &chunks[..2]).unwrap();

        backend.fail_commits(true);
        let replacements = vec![Chunk::zeroed(ELEMS_PER_CHUNK); 3];
        let err = store
            .save_chunks(SpanKind::MinSpan, &keys[..3], &replacements)
            .unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert!(matches!(
            store.delete_chunks(SpanKind::MinSpan, &keys[..2]),
            Err(Error::Backend(_))
        ));
        backend.fail_commits(false);

        let (loaded, existed) = store.load_chunks(SpanKind::MinSpan, &keys[..3]).unwrap();
        assert_eq!(existed, vec![true, true, false]);
        assert_eq!(
            loaded,
            vec![Some(chunks[0].clone()), Some(chunks[1].clone()), None]
        );
    }

    #[test]
    fn zero_elems_per_chunk_is_rejected() {
        let result = ChunkStore::new(Arc::new(InMemoryBackend::new()), 0);
        let err = result.err().unwrap();
        assert!(matches!(err, Error::ZeroElemsPerChunk));
        assert!(err.is_input_shape());
    }

    #[test]
    fn empty_key_list_is_a_no_op() {
        let store = store();
        store.save_chunks(SpanKind::MinSpan, &[], &[]).unwrap();
        let (loaded, existed) = store.load_chunks(SpanKind::MinSpan, &[]).unwrap();
        assert!(loaded.is_empty());
        assert!(existed.is_empty());
    }
}
