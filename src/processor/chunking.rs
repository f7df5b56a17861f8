//! # Sentence Chunking Module
//!
//! Splits normalized page text into chunks that fit a single extraction
//! request.
//!
//! ## Chunking Strategy
//!
//! 1. Newlines are collapsed to spaces and the text is split on `.` into
//!    sentence-like units; units that are empty after trimming are dropped
//! 2. Each unit is sized with [`estimate_tokens`] (`words * 1.3`)
//! 3. Units are packed greedily, in order, until the next one would exceed
//!    the budget; the finished chunk is the units joined with `". "` plus a
//!    trailing `.`
//! 4. A unit that alone exceeds the budget becomes its own chunk rather than
//!    being split mid-sentence
//!
//! The chunker never reorders text and never drops a non-empty unit.

use crate::processor::{ChunkOptions, estimate_tokens};
use serde::Serialize;
use tracing::{debug, instrument};

/// A chunk of text ready for extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChunk {
    /// The text of the chunk
    pub text: String,

    /// The position of the chunk in the original document
    pub position: usize,

    /// Estimated size of the chunk in tokens
    pub estimated_tokens: f64,
}

/// Split text into sentence-like units, in order, without empty units
pub fn sentence_units(text: &str) -> Vec<&str> {
    text.split('.')
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .collect()
}

/// Chunk text into pieces of at most `options.max_chunk_tokens` estimated tokens
///
/// # Arguments
///
/// * `text` - The normalized text to chunk
/// * `options` - Chunking options
///
/// # Returns
///
/// The chunks in document order. Empty input yields no chunks.
#[instrument(skip(text), fields(len = text.len()))]
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<TextChunk> {
    let collapsed = text.replace('\n', " ");
    let budget = options.max_chunk_tokens as f64;

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0.0;

    for unit in sentence_units(&collapsed) {
        let unit_size = estimate_tokens(unit);

        if current_size + unit_size > budget {
            if !current.is_empty() {
                push_chunk(&mut chunks, &current, current_size);
            }
            current = vec![unit];
            current_size = unit_size;
        } else {
            current.push(unit);
            current_size += unit_size;
        }
    }

    if !current.is_empty() {
        push_chunk(&mut chunks, &current, current_size);
    }

    debug!("Split text into {} chunks", chunks.len());
    chunks
}

fn push_chunk(chunks: &mut Vec<TextChunk>, units: &[&str], size: f64) {
    chunks.push(TextChunk {
        text: format!("{}.", units.join(". ")),
        position: chunks.len(),
        estimated_tokens: size,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max_chunk_tokens: usize) -> ChunkOptions {
        ChunkOptions { max_chunk_tokens }
    }

    fn texts(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", &options(10)).is_empty());
        assert!(chunk_text(" . \n . ", &options(10)).is_empty());
    }

    #[test]
    fn test_known_boundaries() {
        // Sizes: 2.6, 5.2, 1.3 against a budget of 10
        let chunks = chunk_text("Alpha beta. Gamma delta epsilon zeta. Eta.", &options(10));

        assert_eq!(
            texts(&chunks),
            vec!["Alpha beta. Gamma delta epsilon zeta. Eta."]
        );

        // Budget of 5: the second unit no longer fits with the first
        let chunks = chunk_text("Alpha beta. Gamma delta epsilon zeta. Eta.", &options(5));
        assert_eq!(
            texts(&chunks),
            vec!["Alpha beta.", "Gamma delta epsilon zeta.", "Eta."]
        );
        assert_eq!(chunks[1].position, 1);
    }

    #[test]
    fn test_deterministic() {
        let input = "Alpha beta. Gamma delta epsilon zeta. Eta.";
        let first = chunk_text(input, &options(10));
        let second = chunk_text(input, &options(10));
        assert_eq!(first, second);
    }

    #[test]
    fn test_oversize_unit_is_its_own_chunk() {
        let input = "One two. Three four five six seven eight nine ten eleven twelve. End";
        let chunks = chunk_text(input, &options(4));

        assert_eq!(
            texts(&chunks),
            vec![
                "One two.",
                "Three four five six seven eight nine ten eleven twelve.",
                "End."
            ]
        );
        assert!(chunks[1].estimated_tokens > 4.0);
    }

    #[test]
    fn test_oversize_first_unit() {
        let chunks = chunk_text("a b c d e f g h. i", &options(2));
        assert_eq!(texts(&chunks), vec!["a b c d e f g h.", "i."]);
    }

    #[test]
    fn test_newlines_are_collapsed() {
        let chunks = chunk_text("# Heading\nfirst line\nsecond. Next", &options(100));
        assert_eq!(texts(&chunks), vec!["# Heading first line second. Next."]);
    }

    #[test]
    fn test_units_are_preserved_in_order() {
        let input = "The quick brown fox. Jumps over\nthe lazy dog. \
                     Pack my box with five dozen liquor jugs. \
                     How vexingly quick daft zebras jump. Sphinx of black quartz. Judge my vow.";
        let collapsed = input.replace('\n', " ");
        let expected = sentence_units(&collapsed);

        for budget in [1, 3, 5, 8, 13, 1000] {
            let chunks = chunk_text(input, &options(budget));
            let joined = chunks
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            assert_eq!(sentence_units(&joined), expected, "budget {}", budget);
        }
    }

    #[test]
    fn test_chunks_respect_budget() {
        let input = "a b. c d e. f. g h i j. k l. m n o. p.";
        let budget = 7;
        let largest_unit = sentence_units(input)
            .into_iter()
            .map(estimate_tokens)
            .fold(0.0, f64::max);
        assert!(largest_unit <= budget as f64);

        for chunk in chunk_text(input, &options(budget)) {
            assert!(
                chunk.estimated_tokens <= budget as f64,
                "chunk {:?} exceeds budget",
                chunk.text
            );
            assert!((estimate_tokens(&chunk.text) - chunk.estimated_tokens).abs() < 1e-9);
        }
    }
}
