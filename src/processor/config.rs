//! Configuration for the chunker

use crate::config::{Config, DEFAULT_CHUNK_SIZE};

/// Configuration for chunking text
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOptions {
    /// Budget per chunk in estimated tokens (see `estimate_tokens`)
    pub max_chunk_tokens: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chunk_tokens: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl From<&Config> for ChunkOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_chunk_tokens: config.chunk_size,
        }
    }
}
