use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::discovery::{ChannelScraper, EpisodeSource};
use crate::episode::{Episode, EpisodeState};
use crate::error::{PodwiseError, Result, TranscriptError};
use crate::extraction::{ContentExtractor, ProcessingResult};
use crate::ledger::LedgerStore;
use crate::llm::{create_llm, LLM};
use crate::transcript::{TranscriptFile, TranscriptSource, YouTubeTranscriptFetcher};

/// Three-stage episode pipeline: discovery, transcription, analysis.
///
/// Each stage reloads the ledger, processes episodes one at a time in
/// discovery order and saves the full row set once the iteration is done.
/// Per-episode faults are logged and recorded in the episode's state; only
/// stage-level faults are returned.
pub struct Pipeline<'a> {
    config: &'a Config,
    ledger: LedgerStore,
    discovery: Box<dyn EpisodeSource>,
    transcripts: Box<dyn TranscriptSource>,
    extractor: ContentExtractor,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        discovery: Box<dyn EpisodeSource>,
        transcripts: Box<dyn TranscriptSource>,
        llm: Box<dyn LLM>,
    ) -> Self {
        Self {
            config,
            ledger: LedgerStore::new(config.ledger_path()),
            discovery,
            transcripts,
            extractor: ContentExtractor::from_config(llm, config),
        }
    }

    /// Build the pipeline with the channel scraper, caption fetcher and the
    /// configured LLM provider
    pub fn from_config(config: &'a Config) -> Result<Self> {
        let timeout = config.source.request_timeout_seconds;

        let discovery = ChannelScraper::new(&config.source.channel_url, timeout)?;
        info!("📺 Channel: {} ({})", discovery.channel_name(), discovery.videos_url());
        let transcripts =
            YouTubeTranscriptFetcher::new(timeout, config.source.transcript_languages.clone())
                .map_err(|e| PodwiseError::Configuration(e.to_string()))?;
        let llm = create_llm(&config.llm)
            .map_err(|e| PodwiseError::Configuration(format!("LLM setup failed: {}", e)))?;

        info!("🤖 Using {} model {}", llm.provider_type(), config.llm.model);

        Ok(Self::new(
            config,
            Box::new(discovery),
            Box::new(transcripts),
            llm,
        ))
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    fn base_dir(&self) -> &Path {
        &self.config.output.base_dir
    }

    fn resume(&self) -> bool {
        self.config.pipeline.resume
    }

    /// Run all three stages in order. Stage-level faults abort the run.
    pub async fn process_all(&self) -> Result<RunReport> {
        let started_at = Utc::now();

        if !self.extractor.llm_available().await {
            warn!(
                "⚠️ {} endpoint {} is not reachable, analysis requests will likely fail",
                self.config.llm.provider,
                self.config.llm.resolved_endpoint()
            );
        }

        info!("Step 1/3: Episode Discovery");
        self.run_discovery().await?;

        info!("Step 2/3: Transcript Retrieval");
        self.run_transcription().await?;

        info!("Step 3/3: Content Analysis");
        let episodes = self.run_analysis().await?;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            ledger_path: self.ledger.path().to_path_buf(),
            episodes,
        };

        info!(
            "🎉 Run completed in {:.2}s: {} analyzed, {} analysis failed, {} without transcript",
            report.duration().as_secs_f64(),
            report.count(EpisodeState::Analyzed),
            report.count(EpisodeState::AnalysisFailed),
            report.count(EpisodeState::TranscriptUnavailable)
        );

        Ok(report)
    }

    /// Discover the most recent episodes and seed the ledger with them
    pub async fn run_discovery(&self) -> Result<Vec<Episode>> {
        let limit = self.config.source.episode_count;
        let discovered = self.discovery.list_recent_episodes(limit).await?;

        if discovered.len() > limit {
            warn!(
                "Discovery returned {} episodes, keeping the first {}",
                discovered.len(),
                limit
            );
        }
        let discovered = discovered.into_iter().take(limit).collect::<Vec<_>>();

        std::fs::create_dir_all(self.base_dir())?;

        let episodes = if self.resume() {
            self.ledger.seed_preserving(discovered)?
        } else {
            self.ledger.seed(discovered)?
        };

        info!("🔍 Discovered {} episodes", episodes.len());
        Ok(episodes)
    }

    /// Fetch and persist a transcript for every episode that needs one
    pub async fn run_transcription(&self) -> Result<Vec<Episode>> {
        let mut episodes = self
            .ledger
            .load()
            .map_err(|e| PodwiseError::Transcription(e.to_string()))?;
        let cooldown = Duration::from_millis(self.config.pipeline.transcript_cooldown_ms);

        for (index, episode) in episodes.iter_mut().enumerate() {
            if !self.should_fetch(episode) {
                debug!("Episode {}: transcript already present, skipping", index + 1);
                continue;
            }

            info!("📝 Episode {}: fetching transcript for {}", index + 1, episode.title);
            self.transcribe_episode(index, episode).await;
            cool_down(cooldown).await;
        }

        self.ledger
            .save(&episodes)
            .map_err(|e| PodwiseError::Transcription(e.to_string()))?;

        Ok(episodes)
    }

    /// Extract books, products and a summary for every transcribed episode
    pub async fn run_analysis(&self) -> Result<Vec<Episode>> {
        let mut episodes = self
            .ledger
            .load()
            .map_err(|e| PodwiseError::Analysis(e.to_string()))?;

        for (index, episode) in episodes.iter_mut().enumerate() {
            if !self.should_analyze(episode) {
                if episode.has_transcript() {
                    debug!("Episode {}: already {}, skipping", index + 1, episode.state);
                } else {
                    info!("Episode {}: No content (transcript unavailable)", index + 1);
                }
                continue;
            }

            info!("🧠 Episode {}: analyzing {}", index + 1, episode.title);
            if let Err(e) = self.analyze_episode(episode).await {
                error!("Error processing episode {} ({}): {}", index + 1, episode.title, e);
                record(index, episode.mark_analysis_failed());
            }
        }

        self.ledger
            .save(&episodes)
            .map_err(|e| PodwiseError::Analysis(e.to_string()))?;

        Ok(episodes)
    }

    fn should_fetch(&self, episode: &Episode) -> bool {
        if !self.resume() {
            return episode.state == EpisodeState::Discovered;
        }
        episode.state.needs_transcript()
            || !self.base_dir().join(episode.transcript_filename()).exists()
    }

    fn should_analyze(&self, episode: &Episode) -> bool {
        if !self.resume() {
            return episode.state == EpisodeState::Transcribed;
        }
        episode.state.needs_analysis()
    }

    async fn transcribe_episode(&self, index: usize, episode: &mut Episode) {
        let segments = match self.transcripts.fetch(&episode.external_id).await {
            Ok(segments) => segments,
            Err(TranscriptError::Unavailable(reason)) => {
                warn!("Episode {}: No transcript available ({})", index + 1, reason);
                record(index, episode.mark_transcript_unavailable());
                return;
            }
            Err(e) => {
                error!("Episode {}: transcript fetch failed: {}", index + 1, e);
                record(index, episode.mark_transcript_unavailable());
                return;
            }
        };

        let path = self.base_dir().join(episode.transcript_filename());
        match TranscriptFile::write(&path, &segments).await {
            Ok(()) => {
                info!(
                    "✅ Episode {}: transcript saved ({} segments) to {}",
                    index + 1,
                    segments.len(),
                    path.display()
                );
                record(index, episode.mark_transcribed());
            }
            Err(e) => {
                error!("Episode {}: cannot write {}: {}", index + 1, path.display(), e);
                record(index, episode.mark_transcript_unavailable());
            }
        }
    }

    async fn analyze_episode(&self, episode: &mut Episode) -> Result<()> {
        let transcript_path = self.base_dir().join(episode.transcript_filename());
        let text = TranscriptFile::read_text(&transcript_path).await?;

        let ProcessingResult {
            books,
            products,
            summary,
        } = self.extractor.extract(&text).await;

        let summary_file = if summary.is_empty() {
            None
        } else {
            let name = episode.summary_filename();
            tokio::fs::write(self.base_dir().join(&name), &summary).await?;
            Some(name)
        };

        info!(
            "✅ {}: {} books, {} products, summary {}",
            episode.title,
            books.len(),
            products.len(),
            summary_file.as_deref().unwrap_or("none")
        );

        episode.mark_analyzed(books, products, summary_file)
    }
}

async fn cool_down(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Log a rejected state transition; the episode keeps its previous state
fn record(index: usize, transition: Result<()>) {
    if let Err(e) = transition {
        warn!("Episode {}: {}", index + 1, e);
    }
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ledger_path: PathBuf,
    pub episodes: Vec<Episode>,
}

impl RunReport {
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Number of episodes that ended the run in `state`
    pub fn count(&self, state: EpisodeState) -> usize {
        self.episodes.iter().filter(|e| e.state == state).count()
    }

    pub fn analyzed(&self) -> impl Iterator<Item = &Episode> {
        self.episodes
            .iter()
            .filter(|e| e.state == EpisodeState::Analyzed)
    }
}

const RULE: &str = "----------------------------------------------------";

fn or_none(items: Vec<String>) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join("; ")
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for episode in self.analyzed() {
            writeln!(f, "Episode: {}", episode.title)?;
            writeln!(
                f,
                "Books: {}",
                or_none(episode.books.iter().map(|b| b.to_string()).collect())
            )?;
            writeln!(
                f,
                "Products: {}",
                or_none(episode.products.iter().map(|p| p.to_string()).collect())
            )?;
            writeln!(
                f,
                "Summary File: {}\n",
                episode.summary_file.as_deref().unwrap_or("None")
            )?;
            writeln!(f, "{}", RULE)?;
        }

        write!(
            f,
            "You can access all the necessary details here: {}",
            self.ledger_path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::{Book, Product};

    fn report(episodes: Vec<Episode>) -> RunReport {
        let now = Utc::now();
        RunReport {
            started_at: now,
            finished_at: now,
            ledger_path: PathBuf::from("output/episodes.csv"),
            episodes,
        }
    }

    #[test]
    fn test_report_lists_analyzed_episodes_only() {
        let mut analyzed = Episode::discovered("Habits", "a");
        analyzed.mark_transcribed().unwrap();
        analyzed
            .mark_analyzed(
                vec![Book::new("Atomic Habits", "James Clear")],
                vec![],
                Some("Habits_summary.txt".to_string()),
            )
            .unwrap();

        let mut unavailable = Episode::discovered("Private", "b");
        unavailable.mark_transcript_unavailable().unwrap();

        let text = report(vec![analyzed, unavailable]).to_string();

        assert!(text.contains("Episode: Habits\nBooks: Atomic Habits by James Clear\nProducts: None\nSummary File: Habits_summary.txt\n"));
        assert!(!text.contains("Private"));
        assert!(text.ends_with("here: output/episodes.csv"));
    }

    #[test]
    fn test_report_counts() {
        let mut analyzed = Episode::discovered("One", "a");
        analyzed.mark_transcribed().unwrap();
        analyzed
            .mark_analyzed(vec![], vec![Product::new("Kindle", "reader")], None)
            .unwrap();

        let report = report(vec![analyzed, Episode::discovered("Two", "b")]);
        assert_eq!(report.count(EpisodeState::Analyzed), 1);
        assert_eq!(report.count(EpisodeState::Discovered), 1);
        assert_eq!(report.duration(), Duration::ZERO);
        assert!(report.to_string().contains("Summary File: None"));
    }
}
