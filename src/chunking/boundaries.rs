//! Sentence boundary detection for the chunker.

/// Locates sentence boundaries inside a paragraph.
///
/// The chunker walks a paragraph by repeatedly asking for the next boundary in the
/// remaining text, so implementations only ever report the first one. Returned offsets
/// are byte positions just past the sentence's terminal punctuation; the chunker
/// consumes any whitespace that follows. An offset of zero, an offset at or past the
/// end of the remainder, or one that is not a `char` boundary ends detection for that
/// paragraph.
pub trait BoundaryDetector: Send + Sync {
    /// Return the byte offset at which the first sentence of `text` ends, or `None`
    /// when the remainder holds no further boundary.
    fn next_boundary(&self, text: &str) -> Option<usize>;
}

/// Default detector: a run of `.`, `!` or `?` followed by whitespace ends a sentence.
///
/// Terminal punctuation at the very end of a paragraph is not a boundary, so trailing
/// sentences keep their punctuation and are returned as a single piece. Abbreviations
/// ("Mr. Smith") split like any other punctuation; callers needing smarter rules plug
/// in their own [`BoundaryDetector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PunctuationBoundaries;

impl BoundaryDetector for PunctuationBoundaries {
    fn next_boundary(&self, text: &str) -> Option<usize> {
        let mut chars = text.char_indices().peekable();
        while let Some((_, ch)) = chars.next() {
            if !matches!(ch, '.' | '!' | '?') {
                continue;
            }
            if let Some(&(next_idx, next_ch)) = chars.peek()
                && next_ch.is_whitespace()
            {
                return Some(next_idx);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_boundary_after_terminal_punctuation() {
        let detector = PunctuationBoundaries;
        assert_eq!(detector.next_boundary("One. Two."), Some(4));
    }

    #[test]
    fn treats_punctuation_runs_as_one_terminator() {
        let detector = PunctuationBoundaries;
        // Boundary sits after the last mark of the run, before the space.
        assert_eq!(detector.next_boundary("What?! Yes."), Some(6));
    }

    #[test]
    fn ignores_punctuation_without_following_whitespace() {
        let detector = PunctuationBoundaries;
        assert_eq!(detector.next_boundary("version 3.14 rocks"), None);
    }

    #[test]
    fn end_of_text_punctuation_is_not_a_boundary() {
        let detector = PunctuationBoundaries;
        assert_eq!(detector.next_boundary("Done."), None);
    }
}
