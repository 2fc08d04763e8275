//! The shared snapshot slot.

use std::sync::{Arc, PoisonError, RwLock};

use super::types::{IndexSnapshot, IndexStatus};

/// Handle to the currently installed snapshot.
///
/// Readers clone the `Arc` and drop the lock immediately, so a search never blocks
/// on a rebuild. A failed build simply never calls [`KnowledgeIndex::install`], which
/// leaves the previous snapshot serving.
#[derive(Default)]
pub struct KnowledgeIndex {
    current: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl KnowledgeIndex {
    /// Create an empty slot; searches fail with not-ready until a build installs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot currently serving reads, if any.
    pub fn current(&self) -> Option<Arc<IndexSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a snapshot. This is the final, non-suspending step of a build; when
    /// builds overlap, the last successful install wins.
    pub fn install(&self, snapshot: IndexSnapshot) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
    }

    /// Readiness and counts, without suspending.
    pub fn status(&self) -> IndexStatus {
        match self.current() {
            Some(snapshot) => IndexStatus {
                ready: true,
                documents: snapshot.document_count,
                chunks: snapshot.chunks.len(),
                built_at: Some(snapshot.built_at.clone()),
            },
            None => IndexStatus {
                ready: false,
                documents: 0,
                chunks: 0,
                built_at: None,
            },
        }
    }
}
