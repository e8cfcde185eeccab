use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PodwiseError, Result};

/// A book mentioned in an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

/// A product recommended in an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
}

impl Product {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.description)
    }
}

/// Processing state of an episode in the three-stage pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeState {
    /// Seeded by discovery, nothing fetched yet
    Discovered,

    /// Transcript fetched and written to disk
    Transcribed,

    /// Fetch attempted and failed; skipped by analysis
    TranscriptUnavailable,

    /// Extraction completed and results persisted
    Analyzed,

    /// Transcript exists but extraction faulted for this episode
    AnalysisFailed,
}

impl EpisodeState {
    pub const ALL: [EpisodeState; 5] = [
        EpisodeState::Discovered,
        EpisodeState::Transcribed,
        EpisodeState::TranscriptUnavailable,
        EpisodeState::Analyzed,
        EpisodeState::AnalysisFailed,
    ];

    /// Whether a transcript file is expected to exist in this state
    pub fn has_transcript(self) -> bool {
        matches!(
            self,
            EpisodeState::Transcribed | EpisodeState::Analyzed | EpisodeState::AnalysisFailed
        )
    }

    /// Whether the transcription stage should attempt a fetch
    pub fn needs_transcript(self) -> bool {
        matches!(
            self,
            EpisodeState::Discovered | EpisodeState::TranscriptUnavailable
        )
    }

    /// Whether the analysis stage should attempt extraction
    pub fn needs_analysis(self) -> bool {
        matches!(self, EpisodeState::Transcribed | EpisodeState::AnalysisFailed)
    }

    /// Transition table. Transcript outcomes may be recorded from any state
    /// (a re-fetch); analysis outcomes require a transcript.
    pub fn can_transition_to(self, next: EpisodeState) -> bool {
        match next {
            EpisodeState::Discovered => self == EpisodeState::Discovered,
            EpisodeState::Transcribed | EpisodeState::TranscriptUnavailable => true,
            EpisodeState::Analyzed | EpisodeState::AnalysisFailed => self.has_transcript(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeState::Discovered => "discovered",
            EpisodeState::Transcribed => "transcribed",
            EpisodeState::TranscriptUnavailable => "transcript_unavailable",
            EpisodeState::Analyzed => "analyzed",
            EpisodeState::AnalysisFailed => "analysis_failed",
        }
    }
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One episode as discovered on the source feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEpisode {
    pub title: String,
    pub external_id: String,
}

impl DiscoveredEpisode {
    pub fn new(title: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            external_id: external_id.into(),
        }
    }
}

/// One row of the ledger, with typed structured fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub title: String,
    pub external_id: String,
    pub state: EpisodeState,
    pub books: Vec<Book>,
    pub products: Vec<Product>,
    pub summary_file: Option<String>,
}

impl Episode {
    /// Fresh row in the `Discovered` state
    pub fn discovered(title: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            external_id: external_id.into(),
            state: EpisodeState::Discovered,
            books: Vec::new(),
            products: Vec::new(),
            summary_file: None,
        }
    }

    pub fn has_transcript(&self) -> bool {
        self.state.has_transcript()
    }

    /// Name of the transcript file for this episode
    pub fn transcript_filename(&self) -> String {
        transcript_filename(&self.title)
    }

    /// Name of the summary file for this episode
    pub fn summary_filename(&self) -> String {
        summary_filename(&self.transcript_filename())
    }

    pub fn mark_transcribed(&mut self) -> Result<()> {
        self.transition(EpisodeState::Transcribed)?;
        self.clear_results();
        Ok(())
    }

    pub fn mark_transcript_unavailable(&mut self) -> Result<()> {
        self.transition(EpisodeState::TranscriptUnavailable)?;
        self.clear_results();
        Ok(())
    }

    pub fn mark_analyzed(
        &mut self,
        books: Vec<Book>,
        products: Vec<Product>,
        summary_file: Option<String>,
    ) -> Result<()> {
        self.transition(EpisodeState::Analyzed)?;
        self.books = books;
        self.products = products;
        self.summary_file = summary_file;
        Ok(())
    }

    pub fn mark_analysis_failed(&mut self) -> Result<()> {
        self.transition(EpisodeState::AnalysisFailed)?;
        self.clear_results();
        Ok(())
    }

    fn transition(&mut self, next: EpisodeState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(PodwiseError::InvalidTransition {
                external_id: self.external_id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    fn clear_results(&mut self) {
        self.books.clear();
        self.products.clear();
        self.summary_file = None;
    }
}

impl From<DiscoveredEpisode> for Episode {
    fn from(d: DiscoveredEpisode) -> Self {
        Episode::discovered(d.title, d.external_id)
    }
}

/// Generate a filesystem-safe transcript filename from an episode title.
///
/// Alphanumerics, spaces and hyphens are kept; each run of other characters
/// becomes one underscore; surrounding whitespace is trimmed and spaces become
/// underscores.
pub fn transcript_filename(title: &str) -> String {
    let mut safe = String::with_capacity(title.len());
    let mut in_run = false;

    for c in title.chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            safe.push(c);
            in_run = false;
        } else if !in_run {
            safe.push('_');
            in_run = true;
        }
    }

    let stem = safe.trim().replace(' ', "_");
    if stem.is_empty() {
        return "untitled.txt".to_string();
    }
    format!("{}.txt", stem)
}

/// Summary filename derived from a transcript filename
pub fn summary_filename(transcript_filename: &str) -> String {
    match transcript_filename.strip_suffix(".txt") {
        Some(stem) => format!("{}_summary.txt", stem),
        None => format!("{}_summary.txt", transcript_filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_filename_basic() {
        assert_eq!(transcript_filename("My Episode 12"), "My_Episode_12.txt");
        assert_eq!(transcript_filename("Part-2 of 3"), "Part-2_of_3.txt");
    }

    #[test]
    fn test_transcript_filename_collapses_runs() {
        assert_eq!(transcript_filename("Q&A: Part 1"), "Q_A__Part_1.txt");
        assert_eq!(transcript_filename("Why?!?"), "Why_.txt");
        assert_eq!(transcript_filename("a///b"), "a_b.txt");
    }

    #[test]
    fn test_transcript_filename_only_safe_characters() {
        let titles = [
            "What's next? (feat. Guest) #42",
            "Ünïcödé — «quotes» 🎙️",
            "  padded / title  ",
            "tab\tand\nnewline",
        ];

        for title in titles {
            let name = transcript_filename(title);
            let stem = name.strip_suffix(".txt").expect("missing .txt suffix");
            assert!(!stem.contains(".txt"));
            assert!(
                stem.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'),
                "unsafe filename {:?} for {:?}",
                name,
                title
            );
        }
    }

    #[test]
    fn test_transcript_filename_empty_title() {
        assert_eq!(transcript_filename(""), "untitled.txt");
        assert_eq!(transcript_filename("   "), "untitled.txt");
    }

    #[test]
    fn test_summary_filename() {
        assert_eq!(summary_filename("My_Episode.txt"), "My_Episode_summary.txt");
        let episode = Episode::discovered("Deep Work, Revisited", "abc123");
        assert_eq!(episode.summary_filename(), "Deep_Work__Revisited_summary.txt");
    }

    #[test]
    fn test_state_transitions() {
        let mut episode = Episode::discovered("Title", "id1");
        assert!(!episode.has_transcript());

        // Analysis requires a transcript
        assert!(episode.mark_analyzed(vec![], vec![], None).is_err());
        assert_eq!(episode.state, EpisodeState::Discovered);

        episode.mark_transcribed().unwrap();
        assert!(episode.has_transcript());

        episode
            .mark_analyzed(
                vec![Book::new("Atomic Habits", "James Clear")],
                vec![],
                Some("Title_summary.txt".to_string()),
            )
            .unwrap();
        assert_eq!(episode.state, EpisodeState::Analyzed);
        assert_eq!(episode.books.len(), 1);
    }

    #[test]
    fn test_unavailable_is_skipped_by_analysis() {
        let mut episode = Episode::discovered("Title", "id1");
        episode.mark_transcript_unavailable().unwrap();

        assert!(!episode.state.needs_analysis());
        assert!(episode.state.needs_transcript());
        assert!(episode.mark_analysis_failed().is_err());
    }

    #[test]
    fn test_refetch_clears_stale_results() {
        let mut episode = Episode::discovered("Title", "id1");
        episode.mark_transcribed().unwrap();
        episode
            .mark_analyzed(vec![Book::new("A", "B")], vec![Product::new("C", "D")], None)
            .unwrap();

        episode.mark_transcribed().unwrap();
        assert!(episode.books.is_empty());
        assert!(episode.products.is_empty());
        assert!(episode.state.needs_analysis());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Book::new("Dune", "Frank Herbert").to_string(), "Dune by Frank Herbert");
        assert_eq!(Product::new("Kindle", "e-reader").to_string(), "Kindle - e-reader");
        assert_eq!(EpisodeState::TranscriptUnavailable.to_string(), "transcript_unavailable");
    }
}
