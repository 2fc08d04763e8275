//! Corpus loading: document types, the JSON file source, and topic tagging.
//!
//! Documents arrive as a JSON array (`id`, `title`, `content`, optional `tags`).
//! Validation is strict: blank identity fields and duplicate ids fail the load,
//! because silent drops here would surface later as missing chunks. Untagged
//! documents are tagged from the declarative keyword table in `tags`.

mod loader;
mod tags;

pub use loader::{JsonFileCorpus, parse_corpus};
pub(crate) use tags::normalize_tag_list;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::get_config;

/// A knowledge-base document as loaded from the corpus.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    /// Unique identifier, referenced by chunk ids and `docIds` filters.
    pub id: String,
    /// Human-readable title copied onto every chunk.
    pub title: String,
    /// Body text handed to the chunker.
    pub content: String,
    /// Lowercase topic tags; derived from the keyword table when the file omits them.
    pub tags: Vec<String>,
}

/// Errors raised while loading the corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus file could not be read.
    #[error("Failed to read corpus file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The corpus file was not valid JSON of the expected shape.
    #[error("Failed to parse corpus file {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// A document failed validation.
    #[error("Invalid document at position {position}: {reason}")]
    InvalidDocument {
        /// Zero-based position in the corpus array.
        position: usize,
        /// Which check failed.
        reason: String,
    },
    /// Two documents share the same id.
    #[error("Duplicate document id: {id}")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },
}

/// Source of knowledge-base documents.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Load the full document list in corpus order.
    async fn load(&self) -> Result<Vec<Document>, CorpusError>;
}

/// Build the corpus source for the configured knowledge-base path.
pub fn get_corpus_source() -> Box<dyn CorpusSource> {
    let config = get_config();
    Box::new(JsonFileCorpus::new(config.knowledge_base_path.clone()))
}
