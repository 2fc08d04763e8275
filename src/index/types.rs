//! Data types shared between index building and search.

/// A chunk of a source document together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Chunk identifier, `"<docId>_<n>"` with `n` starting at 1 per document.
    pub id: String,
    /// Id of the source document.
    pub doc_id: String,
    /// Title copied from the source document.
    pub title: String,
    /// Tags copied from the source document.
    pub tags: Vec<String>,
    /// Chunk text, including any overlap prefix.
    pub text: String,
    /// Embedding vector; every chunk in a snapshot has the same length.
    pub embedding: Vec<f32>,
}

/// Immutable product of one successful index build.
///
/// Snapshots are shared behind an `Arc` and never mutated, so searches that hold one
/// keep a consistent view even while a rebuild installs a replacement.
#[derive(Debug)]
pub struct IndexSnapshot {
    /// Chunks in corpus order, contiguous per document.
    pub chunks: Vec<Chunk>,
    /// Number of source documents.
    pub document_count: usize,
    /// Embedding dimension; 0 when the corpus produced no chunks.
    pub dimension: usize,
    /// RFC 3339 timestamp recorded when the build assembled the snapshot.
    pub built_at: String,
}

/// Counts returned by a completed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    /// Documents processed.
    pub documents: usize,
    /// Chunks embedded and installed.
    pub chunks: usize,
}

/// Readiness report for the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatus {
    /// Whether a snapshot is installed and serving searches.
    pub ready: bool,
    /// Documents in the installed snapshot, 0 when not ready.
    pub documents: usize,
    /// Chunks in the installed snapshot, 0 when not ready.
    pub chunks: usize,
    /// Install timestamp of the current snapshot.
    pub built_at: Option<String>,
}
