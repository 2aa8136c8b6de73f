/// Tables in the storage layer.
///
/// Each slasher component owns its tables exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Attestation records: (validator_index || target_epoch) -> AttestationRecord
    ///
    /// Keys are big-endian so that all records of a validator are contiguous
    /// and ordered by target epoch.
    AttestationRecords,
    /// Latest attested epoch: validator_index -> epoch
    LatestEpoch,
    /// Min span chunks: chunk_index -> Chunk
    MinSpanChunks,
    /// Max span chunks: chunk_index -> Chunk
    MaxSpanChunks,
}

impl Table {
    /// Stable name of the table, also used as the RocksDB column family.
    pub fn name(&self) -> &'static str {
        match self {
            Table::AttestationRecords => "attestation-records",
            Table::LatestEpoch => "latest-epoch",
            Table::MinSpanChunks => "min-span-chunks",
            Table::MaxSpanChunks => "max-span-chunks",
        }
    }
}

/// All table variants.
pub const ALL_TABLES: [Table; 4] = [
    Table::AttestationRecords,
    Table::LatestEpoch,
    Table::MinSpanChunks,
    Table::MaxSpanChunks,
];
