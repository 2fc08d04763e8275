use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing index builds and search traffic.
#[derive(Default)]
pub struct IndexMetrics {
    builds_completed: AtomicU64,
    documents_indexed: AtomicU64,
    chunks_indexed: AtomicU64,
    searches_served: AtomicU64,
}

impl IndexMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed build with its document and chunk counts.
    pub fn record_build(&self, documents: u64, chunks: u64) {
        self.builds_completed.fetch_add(1, Ordering::Relaxed);
        self.documents_indexed.fetch_add(documents, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunks, Ordering::Relaxed);
    }

    /// Record one served search (plain or advanced).
    pub fn record_search(&self) {
        self.searches_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            builds_completed: self.builds_completed.load(Ordering::Relaxed),
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            searches_served: self.searches_served.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Number of successful index builds since startup.
    pub builds_completed: u64,
    /// Cumulative documents processed across all builds.
    pub documents_indexed: u64,
    /// Cumulative chunks embedded across all builds.
    pub chunks_indexed: u64,
    /// Searches answered since startup.
    pub searches_served: u64,
}
