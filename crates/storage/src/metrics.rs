//! Prometheus metrics for the slasher database.

use std::sync::LazyLock;

use lambdaslash_metrics::{
    Histogram, HistogramVec, IntCounter, IntCounterVec, TimingGuard, register_histogram,
    register_histogram_vec, register_int_counter, register_int_counter_vec,
};

/// Increment the counter of double votes found by ingested batches.
pub fn inc_double_votes(count: u64) {
    static SLASHER_DOUBLE_VOTES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
        register_int_counter!(
            "slasher_attester_double_votes_total",
            "Count of attester double votes detected in ingested batches"
        )
        .unwrap()
    });
    SLASHER_DOUBLE_VOTES_TOTAL.inc_by(count);
}

/// Increment the written attestation records counter.
pub fn inc_records_written(count: u64) {
    static SLASHER_ATTESTATION_RECORDS_WRITTEN_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
        register_int_counter!(
            "slasher_attestation_records_written_total",
            "Count of attestation records written"
        )
        .unwrap()
    });
    SLASHER_ATTESTATION_RECORDS_WRITTEN_TOTAL.inc_by(count);
}

/// Increment the pruned attestation records counter.
pub fn inc_records_pruned(count: u64) {
    static SLASHER_ATTESTATION_RECORDS_PRUNED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
        register_int_counter!(
            "slasher_attestation_records_pruned_total",
            "Count of attestation records pruned"
        )
        .unwrap()
    });
    SLASHER_ATTESTATION_RECORDS_PRUNED_TOTAL.inc_by(count);
}

static SLASHER_CHUNKS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "slasher_chunks_total",
        "Count of span chunks handled, by span kind and operation",
        &["kind", "operation"]
    )
    .unwrap()
});

/// Increment the loaded chunks counter. Only chunks that existed are counted.
pub fn inc_chunks_loaded(kind: &str, count: u64) {
    SLASHER_CHUNKS_TOTAL
        .with_label_values(&[kind, "load"])
        .inc_by(count);
}

/// Increment the saved chunks counter.
pub fn inc_chunks_saved(kind: &str, count: u64) {
    SLASHER_CHUNKS_TOTAL
        .with_label_values(&[kind, "save"])
        .inc_by(count);
}

/// Start timing a double vote check. Recorded when the guard is dropped.
pub fn time_double_vote_check() -> TimingGuard {
    static SLASHER_DOUBLE_VOTE_CHECK_TIME_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
        register_histogram!(
            "slasher_double_vote_check_time_seconds",
            "Duration to check a batch of attestations for double votes",
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 1.0]
        )
        .unwrap()
    });
    TimingGuard::new(SLASHER_DOUBLE_VOTE_CHECK_TIME_SECONDS.clone())
}

/// Start timing a chunk load or save for a span kind.
pub fn time_chunk_io(kind: &str, operation: &str) -> TimingGuard {
    static SLASHER_CHUNK_IO_TIME_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
        register_histogram_vec!(
            "slasher_chunk_io_time_seconds",
            "Duration to load or save a batch of span chunks",
            &["kind", "operation"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 1.0]
        )
        .unwrap()
    });
    TimingGuard::new(SLASHER_CHUNK_IO_TIME_SECONDS.with_label_values(&[kind, operation]))
}
