//! Transcript retrieval and the on-disk transcript format
//!
//! Segments are fetched through a `TranscriptSource` and persisted one per line
//! as `HH:MM:SS text`.

pub mod format;
pub mod youtube;

pub use format::{format_timestamp, parse_transcript, render_transcript, TranscriptFile};
pub use youtube::YouTubeTranscriptFetcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;

/// One timed piece of transcript text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Whole seconds from the start of the episode
    pub offset_seconds: u64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(offset_seconds: u64, text: impl Into<String>) -> Self {
        Self {
            offset_seconds,
            text: text.into(),
        }
    }

    /// Build from a fractional start time; sub-second precision is truncated
    pub fn from_start_secs(start: f64, text: impl Into<String>) -> Self {
        let offset_seconds = if start.is_finite() && start > 0.0 {
            start.trunc() as u64
        } else {
            0
        };
        Self::new(offset_seconds, text)
    }
}

/// Source of transcripts keyed by an episode's external id
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, external_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}
