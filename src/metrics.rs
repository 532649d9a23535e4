//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

/// Sync calls by outcome (`unchanged`, `updated`, `failed`).
pub static SYNCS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "repochunk_syncs_total",
        "Number of repository sync calls",
        &["outcome"]
    )
    .expect("register repochunk_syncs_total")
});

/// File changes reported by sync, by kind.
pub static CHANGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "repochunk_changes_total",
        "Number of file changes detected between sync points",
        &["kind"]
    )
    .expect("register repochunk_changes_total")
});

/// Callbacks that returned an error or panicked.
pub static CALLBACK_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "repochunk_callback_failures_total",
        "Number of change callbacks that failed"
    )
    .expect("register repochunk_callback_failures_total")
});

/// Chunks written to a chunk store.
pub static CHUNKS_WRITTEN_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "repochunk_chunks_written_total",
        "Number of chunks written to the index"
    )
    .expect("register repochunk_chunks_written_total")
});

/// Sources removed from a chunk store.
pub static FILES_REMOVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "repochunk_files_removed_total",
        "Number of files whose chunks were removed from the index"
    )
    .expect("register repochunk_files_removed_total")
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    Lazy::force(&SYNCS_TOTAL);
    Lazy::force(&CHANGES_TOTAL);
    Lazy::force(&CALLBACK_FAILURES_TOTAL);
    Lazy::force(&CHUNKS_WRITTEN_TOTAL);
    Lazy::force(&FILES_REMOVED_TOTAL);

    tracing::debug!("Prometheus metrics initialized");
}

/// Render the default registry in the Prometheus text format.
#[must_use]
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
