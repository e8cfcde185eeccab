use std::time::Duration;
use tracing::{debug, error};

use super::chunker::split_into_chunks;
use super::merge::{merge_candidates, MergedCandidates};
use super::parser::{parse_chunk_response, ChunkCandidates};
use super::ProcessingResult;
use crate::config::Config;
use crate::error::{PodwiseError, Result};
use crate::llm::{ChatMessage, LLM};

/// Chunked extractor: one LLM request per chunk, then one summary request
pub struct ContentExtractor {
    llm: Box<dyn LLM>,
    chunk_size: usize,
    temperature: f32,
    cooldown: Duration,
}

impl ContentExtractor {
    pub fn new(llm: Box<dyn LLM>, chunk_size: usize, temperature: f32, cooldown: Duration) -> Self {
        Self {
            llm,
            chunk_size,
            temperature,
            cooldown,
        }
    }

    pub fn from_config(llm: Box<dyn LLM>, config: &Config) -> Self {
        Self::new(
            llm,
            config.pipeline.chunk_size,
            config.llm.temperature,
            Duration::from_millis(config.pipeline.llm_cooldown_ms),
        )
    }

    /// Whether the model endpoint answers at all
    pub async fn llm_available(&self) -> bool {
        self.llm.is_available().await
    }

    /// Extract books, products and a Q&A summary from transcript text.
    ///
    /// A failing chunk contributes nothing; a failing summary request leaves
    /// the summary empty. Neither aborts the episode.
    pub async fn extract(&self, transcript: &str) -> ProcessingResult {
        let chunks = split_into_chunks(transcript, self.chunk_size);
        debug!(
            "Analyzing transcript ({} chars) in {} chunks",
            transcript.len(),
            chunks.len()
        );

        let mut candidates = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            match self.extract_chunk(chunk).await {
                Ok(chunk_candidates) => candidates.push(chunk_candidates),
                Err(e) => error!("Error processing chunk {}/{}: {}", i + 1, chunks.len(), e),
            }
        }

        let merged = merge_candidates(candidates);
        let summary = self.summarize(&merged).await;

        ProcessingResult {
            books: merged.books,
            products: merged.products,
            summary,
        }
    }

    async fn extract_chunk(&self, chunk: &str) -> Result<ChunkCandidates> {
        let messages = vec![
            ChatMessage::system(Self::extraction_system_prompt()),
            ChatMessage::user(format!(
                "{}\n\nTranscript section:\n{}",
                Self::extraction_prompt(),
                chunk
            )),
        ];

        let response = self.llm.chat(messages, self.temperature).await;
        self.cool_down().await;

        let response = response
            .map_err(|e| PodwiseError::Extraction(format!("LLM request failed: {}", e)))?;
        debug!("Chunk analyzed (tokens: {:?})", response.tokens_used);

        parse_chunk_response(response.content.trim())
    }

    async fn summarize(&self, merged: &MergedCandidates) -> String {
        if merged.summary_fragments.is_empty() {
            debug!("No summary points collected, requesting summary anyway");
        }

        let messages = vec![
            ChatMessage::system(Self::summary_system_prompt()),
            ChatMessage::user(format!(
                "{}\n\n{}",
                Self::summary_prompt(),
                merged.summary_input()
            )),
        ];

        let response = self.llm.chat(messages, self.temperature).await;
        self.cool_down().await;

        match response {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                error!("Error generating summary: {}", e);
                String::new()
            }
        }
    }

    async fn cool_down(&self) {
        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }
    }

    fn extraction_system_prompt() -> &'static str {
        "You analyze podcast transcripts for specific content."
    }

    fn extraction_prompt() -> &'static str {
        r#"Analyze this podcast transcript section:
1. Extract published books (Format: Title by Author)
2. Extract specific product recommendations (Format: Product - Description)
3. Extract key Q&A points for summary

If none found for books/products, return "None" for that section.

Format response as:
BOOKS:
[books list]

PRODUCTS:
[products list]

SUMMARY:
[key points]"#
    }

    fn summary_system_prompt() -> &'static str {
        "You create clear Q&A summaries from podcast discussions."
    }

    fn summary_prompt() -> &'static str {
        "Create a concise Q&A style summary from these discussion points.\n\
         Format as 3-5 key Q&A pairs focused on main insights."
    }
}
