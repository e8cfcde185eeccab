//! Chunked content extraction
//!
//! Transcript text is cut into bounded chunks, each chunk is sent to the LLM,
//! the labeled responses are parsed into candidates, and the candidates are
//! merged into one deduplicated `ProcessingResult` per episode.

pub mod chunker;
pub mod extractor;
pub mod merge;
pub mod parser;

pub use chunker::split_into_chunks;
pub use extractor::ContentExtractor;
pub use merge::{dedup_case_insensitive, merge_candidates, MergedCandidates};
pub use parser::{parse_chunk_response, ChunkCandidates};

use serde::{Deserialize, Serialize};

use crate::episode::{Book, Product};

/// Default maximum chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 8000;

/// Per-episode extraction output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub books: Vec<Book>,
    pub products: Vec<Product>,
    pub summary: String,
}

impl ProcessingResult {
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.products.is_empty() && self.summary.is_empty()
    }
}
