//! Episode discovery
//!
//! Lists the most recent episodes of a creator's feed as `(title, external_id)`
//! pairs, newest first.

pub mod channel;

pub use channel::ChannelScraper;

use async_trait::async_trait;

use crate::episode::DiscoveredEpisode;
use crate::error::Result;

/// Source of recent episodes. Faults are `PodwiseError::Discovery` and abort the run.
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    async fn list_recent_episodes(&self, limit: usize) -> Result<Vec<DiscoveredEpisode>>;
}
