//! Candidate filtering for advanced search.

use crate::index::Chunk;
use crate::planner::PlanFilters;

/// Keep the chunks satisfying every filter list; empty lists never narrow.
pub(crate) fn filter_chunks<'a>(chunks: &'a [Chunk], filters: &PlanFilters) -> Vec<&'a Chunk> {
    chunks
        .iter()
        .filter(|chunk| matches_filters(chunk, filters))
        .collect()
}

fn matches_filters(chunk: &Chunk, filters: &PlanFilters) -> bool {
    if !filters.doc_ids.is_empty() && !filters.doc_ids.iter().any(|id| id == &chunk.doc_id) {
        return false;
    }
    if !filters.tags.is_empty()
        && !chunk
            .tags
            .iter()
            .any(|tag| filters.tags.iter().any(|wanted| wanted.eq_ignore_ascii_case(tag)))
    {
        return false;
    }
    if !filters
        .must_include
        .iter()
        .all(|term| contains_ignore_case(&chunk.text, term))
    {
        return false;
    }
    !filters
        .exclude
        .iter()
        .any(|term| contains_ignore_case(&chunk.text, term))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
