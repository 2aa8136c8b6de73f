//! Metrics utilities and prometheus re-exports for lambdaslash.

mod gather;
mod timing;

pub use gather::{GatherError, gather_default_metrics};
pub use timing::TimingGuard;

// Re-export prometheus types and macros we use
pub use prometheus::{
    Encoder, Error as PrometheusError, Histogram, HistogramVec, IntCounter, IntCounterVec,
    TextEncoder, gather, register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec,
};
