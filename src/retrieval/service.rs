//! The retrieval orchestrator tying corpus, providers, index, and ranking together.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chunking::ChunkOptions;
use crate::config::get_config;
use crate::corpus::{self, CorpusSource};
use crate::embedding::{self, EmbeddingClient, EmbeddingClientError};
use crate::generation::{self, GenerationClient};
use crate::index::{IndexSnapshot, IndexStatus, IndexSummary, KnowledgeIndex, build_snapshot};
use crate::metrics::{IndexMetrics, MetricsSnapshot};
use crate::planner::plan_query;
use crate::ranking::{Scored, rank, round_score};

use super::filters::filter_chunks;
use super::types::{AdvancedSearchOutcome, RetrievalError, SearchHit};

/// Tuning knobs for the retrieval service.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    /// Chunking options applied at build time.
    pub chunk_options: ChunkOptions,
    /// Number of chunk texts per embedding request.
    pub embed_batch_size: usize,
    /// `topK` used when a request omits it.
    pub default_top_k: usize,
    /// Upper bound applied to requested `topK` values.
    pub max_top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_options: ChunkOptions::default(),
            embed_batch_size: 40,
            default_top_k: 5,
            max_top_k: 20,
        }
    }
}

impl RetrievalSettings {
    /// Read the settings from global configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            chunk_options: ChunkOptions {
                max_chars: config.chunk_max_chars,
                overlap_chars: config.chunk_overlap_chars,
            },
            embed_batch_size: config.embed_batch_size,
            default_top_k: config.search_default_top_k,
            max_top_k: config.search_max_top_k,
        }
    }
}

/// Operations the HTTP layer relies on.
///
/// The router is generic over this trait so handler tests can substitute a stub
/// service without any provider traffic.
#[async_trait]
pub trait RetrievalApi: Send + Sync {
    /// Rebuild the index from the corpus and install the result.
    async fn build_index(&self) -> Result<IndexSummary, RetrievalError>;

    /// Readiness and counts; never suspends, even while a build runs.
    fn status(&self) -> IndexStatus;

    /// Plain similarity search over the whole index.
    async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchHit>, RetrievalError>;

    /// Planned search: translate, filter, fall back when empty, rank.
    async fn advanced_search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<AdvancedSearchOutcome, RetrievalError>;

    /// Counter snapshot for the metrics endpoint.
    fn metrics(&self) -> MetricsSnapshot;
}

/// Production retrieval service.
///
/// Holds the snapshot slot plus boxed provider clients, so the whole pipeline can
/// be assembled from configuration in `main` or from stubs in tests.
pub struct RetrievalService {
    corpus: Box<dyn CorpusSource>,
    embedding: Box<dyn EmbeddingClient + Send + Sync>,
    generation: Box<dyn GenerationClient + Send + Sync>,
    index: KnowledgeIndex,
    settings: RetrievalSettings,
    metrics: Arc<IndexMetrics>,
}

impl RetrievalService {
    /// Assemble the production service from global configuration.
    pub fn from_config() -> Self {
        Self::new(
            corpus::get_corpus_source(),
            embedding::get_embedding_client(),
            generation::get_generation_client(),
            RetrievalSettings::from_config(),
        )
    }

    /// Assemble a service from explicit parts.
    pub fn new(
        corpus: Box<dyn CorpusSource>,
        embedding: Box<dyn EmbeddingClient + Send + Sync>,
        generation: Box<dyn GenerationClient + Send + Sync>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            corpus,
            embedding,
            generation,
            index: KnowledgeIndex::new(),
            settings,
            metrics: Arc::new(IndexMetrics::new()),
        }
    }

    fn effective_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_top_k)
            .min(self.settings.max_top_k)
    }

    /// Embed one query text and verify its width against the snapshot.
    async fn embed_query(
        &self,
        text: &str,
        snapshot: &IndexSnapshot,
    ) -> Result<Vec<f32>, RetrievalError> {
        let mut vectors = self
            .embedding
            .generate_embeddings(vec![text.to_string()])
            .await?;
        let vector = vectors.pop().ok_or_else(|| {
            RetrievalError::Embedding(EmbeddingClientError::InvalidResponse(
                "provider returned no vector for the query".into(),
            ))
        })?;
        if !snapshot.chunks.is_empty() && vector.len() != snapshot.dimension {
            return Err(RetrievalError::Embedding(
                EmbeddingClientError::InvalidResponse(format!(
                    "query embedding dimension {} does not match index dimension {}",
                    vector.len(),
                    snapshot.dimension
                )),
            ));
        }
        Ok(vector)
    }
}

fn to_hit(scored: Scored<'_>) -> SearchHit {
    SearchHit {
        id: scored.chunk.id.clone(),
        title: scored.chunk.title.clone(),
        tags: scored.chunk.tags.clone(),
        text: scored.chunk.text.clone(),
        score: round_score(scored.score),
    }
}

#[async_trait]
impl RetrievalApi for RetrievalService {
    async fn build_index(&self) -> Result<IndexSummary, RetrievalError> {
        let documents = self.corpus.load().await?;
        tracing::info!(documents = documents.len(), "Building knowledge index");

        let snapshot = build_snapshot(
            &documents,
            self.embedding.as_ref(),
            &self.settings.chunk_options,
            self.settings.embed_batch_size,
        )
        .await?;

        let summary = IndexSummary {
            documents: snapshot.document_count,
            chunks: snapshot.chunks.len(),
        };
        self.index.install(snapshot);
        self.metrics
            .record_build(summary.documents as u64, summary.chunks as u64);
        tracing::info!(
            documents = summary.documents,
            chunks = summary.chunks,
            "Knowledge index installed"
        );
        Ok(summary)
    }

    fn status(&self) -> IndexStatus {
        self.index.status()
    }

    async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        let snapshot = self.index.current().ok_or(RetrievalError::NotReady)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(RetrievalError::InvalidQuery);
        }

        let top_k = self.effective_top_k(top_k);
        let vector = self.embed_query(query, &snapshot).await?;
        let hits: Vec<SearchHit> = rank(&snapshot.chunks, &vector, top_k)
            .into_iter()
            .map(to_hit)
            .collect();

        self.metrics.record_search();
        tracing::debug!(top_k, results = hits.len(), "Search served");
        Ok(hits)
    }

    async fn advanced_search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<AdvancedSearchOutcome, RetrievalError> {
        let snapshot = self.index.current().ok_or(RetrievalError::NotReady)?;
        let original = query.trim();
        if original.is_empty() {
            return Err(RetrievalError::InvalidQuery);
        }

        let top_k = self.effective_top_k(top_k);
        let plan = plan_query(self.generation.as_ref(), original).await?;
        let effective_query = plan
            .translated_query
            .clone()
            .unwrap_or_else(|| original.to_string());

        let candidates = filter_chunks(&snapshot.chunks, &plan.filters);
        let used_fallback = candidates.is_empty();
        if used_fallback && !plan.filters.is_empty() {
            tracing::debug!("Planner filters matched nothing; falling back to the full index");
        }

        let vector = self.embed_query(&effective_query, &snapshot).await?;
        let results: Vec<SearchHit> = if used_fallback {
            rank(&snapshot.chunks, &vector, top_k)
        } else {
            rank(candidates, &vector, top_k)
        }
        .into_iter()
        .map(to_hit)
        .collect();

        self.metrics.record_search();
        tracing::debug!(
            top_k,
            used_fallback,
            results = results.len(),
            "Advanced search served"
        );
        Ok(AdvancedSearchOutcome {
            language: plan.language,
            effective_query,
            filters: plan.filters,
            used_fallback,
            results,
        })
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
