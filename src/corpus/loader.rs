//! JSON corpus file loading and validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::tags::{derive_tags, sanitize_tags};
use super::{CorpusError, CorpusSource, Document};

/// Document shape as it appears on disk; `tags` may be omitted.
#[derive(Debug, Deserialize)]
struct RawDocument {
    id: String,
    title: String,
    content: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Corpus source backed by a JSON array of documents on disk.
pub struct JsonFileCorpus {
    path: PathBuf,
}

impl JsonFileCorpus {
    /// Create a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CorpusSource for JsonFileCorpus {
    async fn load(&self) -> Result<Vec<Document>, CorpusError> {
        let path = self.path.display().to_string();
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CorpusError::Io {
                path: path.clone(),
                source,
            })?;
        parse_corpus(&raw, &path)
    }
}

/// Parse and validate corpus JSON into documents.
///
/// Documents missing explicit tags get theirs from the keyword rule table; explicit
/// tags are trimmed, lowercased and deduplicated instead.
pub fn parse_corpus(raw: &str, path: &str) -> Result<Vec<Document>, CorpusError> {
    let raw_documents: Vec<RawDocument> =
        serde_json::from_str(raw).map_err(|source| CorpusError::Parse {
            path: path.to_string(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut documents = Vec::with_capacity(raw_documents.len());
    for (position, raw_document) in raw_documents.into_iter().enumerate() {
        let id = raw_document.id.trim().to_string();
        let title = raw_document.title.trim().to_string();
        if id.is_empty() {
            return Err(CorpusError::InvalidDocument {
                position,
                reason: "blank id".into(),
            });
        }
        if title.is_empty() {
            return Err(CorpusError::InvalidDocument {
                position,
                reason: "blank title".into(),
            });
        }
        if raw_document.content.trim().is_empty() {
            return Err(CorpusError::InvalidDocument {
                position,
                reason: "blank content".into(),
            });
        }
        if !seen.insert(id.clone()) {
            return Err(CorpusError::DuplicateId { id });
        }

        let tags = sanitize_tags(raw_document.tags)
            .unwrap_or_else(|| derive_tags(&title, &raw_document.content));
        documents.push(Document {
            id,
            title,
            content: raw_document.content,
            tags,
        });
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": "doc-budget",
            "title": "Budget basics",
            "content": "Start with a simple budget and track your cash flow.",
            "tags": [" Budgeting ", "budgeting", "Beginner"]
        },
        {
            "id": "doc-debt",
            "title": "Debt payoff",
            "content": "The debt avalanche targets the highest interest rate first."
        }
    ]"#;

    #[test]
    fn parses_documents_and_normalizes_explicit_tags() {
        let documents = parse_corpus(SAMPLE, "test.json").expect("corpus parses");
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "doc-budget");
        assert_eq!(documents[0].tags, vec!["budgeting", "beginner"]);
    }

    #[test]
    fn derives_tags_when_the_file_omits_them() {
        let documents = parse_corpus(SAMPLE, "test.json").expect("corpus parses");
        assert_eq!(documents[1].tags, vec!["debt"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"[
            {"id": "a", "title": "One", "content": "text"},
            {"id": "a", "title": "Two", "content": "text"}
        ]"#;
        let error = parse_corpus(raw, "test.json").unwrap_err();
        assert!(matches!(error, CorpusError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn rejects_blank_fields() {
        let raw = r#"[{"id": "a", "title": "  ", "content": "text"}]"#;
        let error = parse_corpus(raw, "test.json").unwrap_err();
        assert!(matches!(
            error,
            CorpusError::InvalidDocument { position: 0, .. }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let error = parse_corpus("{not json", "test.json").unwrap_err();
        assert!(matches!(error, CorpusError::Parse { .. }));
    }
}
