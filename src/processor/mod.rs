//! Content processor module
//!
//! This module turns normalized page text into chunks sized for a single
//! extraction request, and owns the word-based token estimate shared with
//! the extraction budget.

mod chunking;
mod config;

pub use chunking::{TextChunk, chunk_text, sentence_units};
pub use config::ChunkOptions;

/// Per-word inflation factor approximating sub-word tokenization.
///
/// Chunk boundaries depend on this value; it must stay in step with the
/// extraction budget.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Approximate token count of a piece of text: `word_count * 1.3`
pub fn estimate_tokens(text: &str) -> f64 {
    word_count(text) as f64 * TOKENS_PER_WORD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_options_default() {
        let options = ChunkOptions::default();
        assert_eq!(options.max_chunk_tokens, 30_000);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  one\ttwo\nthree  "), 3);
    }

    #[test]
    fn test_estimate_tokens() {
        assert!((estimate_tokens("Alpha beta") - 2.6).abs() < 1e-9);
        assert_eq!(estimate_tokens("   "), 0.0);
    }
}
