//! Paragraph/sentence chunking with a sliding character overlap.
//!
//! Documents are chunked in three passes:
//!
//! - Split on blank lines into paragraphs; paragraphs longer than the budget are split
//!   at sentence boundaries and greedily repacked with single-space joins.
//! - Greedily pack the resulting units into chunks joined by blank lines, flushing
//!   whenever the next unit would push the chunk past `max_chars`.
//! - Prepend the tail of each chunk's *original* predecessor (`overlap_chars`
//!   characters) so spans near chunk edges stay visible to retrieval. Overlap never
//!   compounds and the first chunk is never modified.
//!
//! All budgets count characters, not bytes, so multi-byte text is safe. A single
//! sentence longer than the budget is emitted as its own oversized chunk rather than
//! being cut mid-word.

mod boundaries;

pub use boundaries::{BoundaryDetector, PunctuationBoundaries};

/// Options controlling chunk packing and overlap.
#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    /// Upper bound on chunk length in characters, before the overlap pass.
    pub max_chars: usize,
    /// Characters of the previous chunk prepended to each following chunk.
    pub overlap_chars: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chars: 800,
            overlap_chars: 120,
        }
    }
}

/// Chunk `text` using the default punctuation sentence detector.
///
/// Returns an empty vector when the input is all whitespace.
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    chunk_text_with_boundaries(text, options, &PunctuationBoundaries)
}

/// Lower-level chunker that accepts an explicit boundary detector.
///
/// You likely want [`chunk_text`]; this entry point exists for tests and for callers
/// that plug in a custom sentence detector.
pub fn chunk_text_with_boundaries(
    text: &str,
    options: &ChunkOptions,
    detector: &dyn BoundaryDetector,
) -> Vec<String> {
    let mut units = Vec::new();
    for paragraph in split_paragraphs(text) {
        if char_len(&paragraph) > options.max_chars {
            units.extend(split_long_paragraph(&paragraph, options.max_chars, detector));
        } else {
            units.push(paragraph);
        }
    }

    let chunks = pack_units(units, options.max_chars);
    apply_overlap(chunks, options.overlap_chars)
}

/// Split text at blank-line boundaries, trimming each paragraph and dropping empties.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);
    paragraphs
}

fn flush_paragraph(current: &mut String, paragraphs: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
    }
    current.clear();
}

/// Split an oversized paragraph into sentences and greedily repack them.
///
/// Sentences are joined with a single space while the running length stays within
/// `max_chars`; a lone sentence past the budget becomes its own piece.
fn split_long_paragraph(
    paragraph: &str,
    max_chars: usize,
    detector: &dyn BoundaryDetector,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(paragraph, detector) {
        let sentence_chars = char_len(sentence);
        let candidate = if current.is_empty() {
            sentence_chars
        } else {
            current_chars + 1 + sentence_chars
        };

        if candidate > max_chars && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current.push_str(sentence);
            current_chars = sentence_chars;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_chars = candidate;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn split_sentences<'a>(paragraph: &'a str, detector: &dyn BoundaryDetector) -> Vec<&'a str> {
    let mut sentences = Vec::new();
    let mut rest = paragraph;
    while let Some(boundary) = detector.next_boundary(rest) {
        if boundary == 0 || boundary >= rest.len() || !rest.is_char_boundary(boundary) {
            break;
        }
        let (sentence, tail) = rest.split_at(boundary);
        sentences.push(sentence);
        rest = tail.trim_start();
    }
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Greedily pack units into chunks joined by blank lines.
fn pack_units(units: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for unit in units {
        let unit_chars = char_len(&unit);
        let candidate = if current.is_empty() {
            unit_chars
        } else {
            current_chars + 2 + unit_chars
        };

        if candidate > max_chars && !current.is_empty() {
            chunks.push(std::mem::replace(&mut current, unit));
            current_chars = unit_chars;
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&unit);
            current_chars = candidate;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Prepend the tail of each chunk's original predecessor.
///
/// Reads tails from the pre-overlap list so overlap never compounds across chunks.
fn apply_overlap(chunks: Vec<String>, overlap_chars: usize) -> Vec<String> {
    if overlap_chars == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut overlapped = Vec::with_capacity(chunks.len());
    for (position, chunk) in chunks.iter().enumerate() {
        if position == 0 {
            overlapped.push(chunk.clone());
            continue;
        }
        let tail = char_tail(&chunks[position - 1], overlap_chars);
        let combined = format!("{tail}\n\n{chunk}");
        overlapped.push(combined.trim().to_string());
    }
    overlapped
}

/// Last `count` characters of `text`; the whole text when it is shorter.
fn char_tail(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    let total = char_len(text);
    if total <= count {
        return text;
    }
    let start = text
        .char_indices()
        .nth(total - count)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &text[start..]
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
