use crate::episode::EpisodeState;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PodwiseError>;

/// Error types for the episode pipeline
///
/// `Configuration`, `Discovery`, `Transcription` and `Analysis` are stage-level
/// and abort a run. `Extraction` and `InvalidTransition` are scoped to a single
/// chunk or episode and are logged by the orchestrator.
#[derive(thiserror::Error, Debug)]
pub enum PodwiseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Transcription stage failed: {0}")]
    Transcription(String),

    #[error("Analysis stage failed: {0}")]
    Analysis(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Invalid state transition for '{external_id}': {from:?} -> {to:?}")]
    InvalidTransition {
        external_id: String,
        from: EpisodeState,
        to: EpisodeState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Outcome of a failed transcript fetch for one episode
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TranscriptError {
    /// No transcript exists for this episode (disabled, missing, private video)
    #[error("transcript unavailable: {0}")]
    Unavailable(String),

    /// Any other fault while fetching or decoding
    #[error("transcript fetch failed: {0}")]
    Fetch(String),
}

impl From<reqwest::Error> for TranscriptError {
    fn from(e: reqwest::Error) -> Self {
        TranscriptError::Fetch(e.to_string())
    }
}
