use lambdaslash_types::primitives::DecodeError;

use crate::api::{self, Table};

/// Errors returned by the slasher database.
///
/// There is no "not found" variant: a missing record, epoch or chunk is a
/// normal outcome and is reported through `Option`s and existence flags.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The storage backend failed. The enclosing batch had no effect.
    #[error("storage backend error: {0}")]
    Backend(#[from] api::Error),

    /// `save_chunks` was given a different number of keys and chunks.
    #[error("mismatched chunk input: {keys} keys but {chunks} chunks")]
    ChunkCountMismatch { keys: usize, chunks: usize },

    /// A chunk to save does not have `elems_per_chunk` elements.
    #[error("chunk {key} has {len} elements, expected {expected}")]
    ChunkLengthMismatch {
        key: u64,
        len: usize,
        expected: usize,
    },

    /// A chunk store was asked to hold chunks of zero elements.
    #[error("elems_per_chunk must be greater than zero")]
    ZeroElemsPerChunk,

    /// A stored key does not follow the table's layout.
    #[error("corrupt key of length {len} in table {}", .table.name())]
    CorruptKey { table: Table, len: usize },

    /// A stored value could not be decoded.
    #[error("failed to decode value in table {}: {error:?}", .table.name())]
    Decode { table: Table, error: DecodeError },
}

impl Error {
    /// Whether the error was caused by the shape of the caller's input, and
    /// not by the backend or stored data.
    pub fn is_input_shape(&self) -> bool {
        matches!(
            self,
            Error::ChunkCountMismatch { .. }
                | Error::ChunkLengthMismatch { .. }
                | Error::ZeroElemsPerChunk
        )
    }
}
