//! Result and error types for retrieval operations.

use thiserror::Error;

use crate::corpus::CorpusError;
use crate::embedding::EmbeddingClientError;
use crate::generation::GenerationClientError;
use crate::planner::{PlanError, PlanFilters};

/// Errors surfaced by retrieval operations.
///
/// Callers can rely on the variants to tell apart the five failure classes:
/// corpus load, embedding provider, generation provider, not-ready, and invalid
/// query. None of them is retried internally.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The corpus could not be loaded.
    #[error("Failed to load corpus: {0}")]
    Corpus(#[from] CorpusError),
    /// The embedding provider failed or returned an unusable response.
    #[error("Embedding service failed: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// The generation provider failed or returned an unusable plan.
    #[error("Generation service failed: {0}")]
    Generation(#[from] GenerationClientError),
    /// Search attempted before a successful build installed a snapshot.
    #[error("Knowledge base is not ready; build the index first")]
    NotReady,
    /// Query text was empty or whitespace-only.
    #[error("Query text must not be empty")]
    InvalidQuery,
}

impl From<PlanError> for RetrievalError {
    fn from(error: PlanError) -> Self {
        match error {
            PlanError::Generation(inner) => Self::Generation(inner),
            PlanError::MalformedPlan(message) => {
                Self::Generation(GenerationClientError::InvalidResponse(message))
            }
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Chunk id (`"<docId>_<n>"`).
    pub id: String,
    /// Source document title.
    pub title: String,
    /// Source document tags.
    pub tags: Vec<String>,
    /// Chunk text, including any overlap prefix.
    pub text: String,
    /// Similarity rounded to four decimal places.
    pub score: f64,
}

/// Outcome of an advanced search: the applied plan plus the ranked hits.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedSearchOutcome {
    /// Language reported by the planner, when it reported one.
    pub language: Option<String>,
    /// Query text that was embedded (the translation when present, else the original).
    pub effective_query: String,
    /// Normalized filters the planner proposed.
    pub filters: PlanFilters,
    /// Whether filtering emptied the candidate set and the full index was ranked.
    pub used_fallback: bool,
    /// Ranked hits.
    pub results: Vec<SearchHit>,
}
