//! Podwise - podcast episode analyzer
//!
//! Turns a creator's most recent episodes into a small dataset: transcripts,
//! mentioned books, product recommendations and a Q&A summary per episode,
//! tracked in a CSV ledger.

pub mod config;
pub mod discovery;
pub mod episode;
pub mod error;
pub mod extraction;
pub mod ledger;
pub mod llm;
pub mod pipeline;
pub mod transcript;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::discovery::{ChannelScraper, EpisodeSource};
pub use crate::episode::{Book, DiscoveredEpisode, Episode, EpisodeState, Product};
pub use crate::error::{PodwiseError, Result, TranscriptError};
pub use crate::extraction::{ContentExtractor, ProcessingResult};
pub use crate::ledger::LedgerStore;
pub use crate::llm::{ChatMessage, LLMConfig, LLMProvider, LLMResponse, LLM};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::transcript::{TranscriptSegment, TranscriptSource, YouTubeTranscriptFetcher};
