//! Batched, all-or-nothing snapshot construction.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::chunking::{ChunkOptions, chunk_text};
use crate::corpus::Document;
use crate::embedding::{EmbeddingClient, EmbeddingClientError};

use super::types::{Chunk, IndexSnapshot};

/// Chunk metadata collected before embeddings exist.
struct PendingChunk {
    id: String,
    doc_id: String,
    title: String,
    tags: Vec<String>,
    text: String,
}

/// Chunk every document and embed the texts in fixed-size batches.
///
/// The vector for chunk `b * batch_size + i` is element `i` of batch `b`'s response.
/// Any embedding failure, count shortfall, or dimension drift aborts the whole build;
/// callers install the returned snapshot only on success, so no partial state ever
/// becomes visible. An empty corpus yields a ready snapshot with zero chunks and no
/// provider calls.
pub async fn build_snapshot(
    documents: &[Document],
    embedding: &(dyn EmbeddingClient + Send + Sync),
    options: &ChunkOptions,
    batch_size: usize,
) -> Result<IndexSnapshot, EmbeddingClientError> {
    let mut pending = Vec::new();
    for document in documents {
        for (ordinal, text) in chunk_text(&document.content, options).into_iter().enumerate() {
            pending.push(PendingChunk {
                id: format!("{}_{}", document.id, ordinal + 1),
                doc_id: document.id.clone(),
                title: document.title.clone(),
                tags: document.tags.clone(),
                text,
            });
        }
    }

    let texts: Vec<String> = pending.iter().map(|chunk| chunk.text.clone()).collect();
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let batch_vectors = embedding.generate_embeddings(batch.to_vec()).await?;
        if batch_vectors.len() != batch.len() {
            return Err(EmbeddingClientError::InvalidResponse(format!(
                "embedding batch returned {} vectors for {} inputs",
                batch_vectors.len(),
                batch.len()
            )));
        }
        vectors.extend(batch_vectors);
    }

    let dimension = vectors.first().map(Vec::len).unwrap_or(0);
    if !vectors.is_empty() && dimension == 0 {
        return Err(EmbeddingClientError::InvalidResponse(
            "provider returned empty embedding vectors".into(),
        ));
    }
    for vector in &vectors {
        if vector.len() != dimension {
            return Err(EmbeddingClientError::InvalidResponse(format!(
                "embedding dimension drifted across batches: {} then {dimension}",
                vector.len()
            )));
        }
    }

    let chunks = pending
        .into_iter()
        .zip(vectors)
        .map(|(chunk, embedding)| Chunk {
            id: chunk.id,
            doc_id: chunk.doc_id,
            title: chunk.title,
            tags: chunk.tags,
            text: chunk.text,
            embedding,
        })
        .collect();

    Ok(IndexSnapshot {
        chunks,
        document_count: documents.len(),
        dimension,
        built_at: now_rfc3339(),
    })
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
