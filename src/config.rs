use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PodwiseError, Result};
use crate::extraction::DEFAULT_CHUNK_SIZE;
use crate::llm::{LLMConfig, LLMProvider};

/// Configuration for the Podwise episode pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source feed settings
    pub source: SourceConfig,

    /// Output and storage settings
    pub output: OutputConfig,

    /// LLM extraction settings
    pub llm: LLMConfig,

    /// Pipeline behavior settings
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Channel URL episodes are discovered from
    pub channel_url: String,

    /// Number of most recent episodes to process
    pub episode_count: usize,

    /// HTTP timeout for discovery and transcript requests (seconds)
    pub request_timeout_seconds: u64,

    /// Preferred caption languages, most preferred first
    pub transcript_languages: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            channel_url: String::new(),
            episode_count: 5,
            request_timeout_seconds: 30,
            transcript_languages: vec!["en".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding the ledger, transcripts and summaries
    pub base_dir: PathBuf,

    /// Ledger file name inside `base_dir`
    pub ledger_file: String,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./output"),
            ledger_file: "episodes.csv".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum transcript chunk size in characters
    pub chunk_size: usize,

    /// Pause after every LLM request (milliseconds)
    pub llm_cooldown_ms: u64,

    /// Pause after every transcript fetch (milliseconds)
    pub transcript_cooldown_ms: u64,

    /// Keep progress from an existing ledger instead of reseeding it
    pub resume: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            llm_cooldown_ms: 1000,
            transcript_cooldown_ms: 2000,
            resume: false,
        }
    }
}

const CONFIG_PATHS: [&str; 2] = ["podwise.toml", "config/podwise.toml"];

impl Config {
    /// Load configuration from the first config file found, falling back to defaults
    pub fn load() -> Result<Self> {
        for path in CONFIG_PATHS {
            if Path::new(path).exists() {
                let config = Self::from_file(path)?;
                tracing::info!("📄 Loaded configuration from: {}", path);
                return Ok(config);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a TOML file; missing keys take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PodwiseError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Override settings from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override settings from `lookup`, which maps a variable name to its value
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("CHANNEL_URL") {
            self.source.channel_url = url;
        }

        if let Some(dir) = get("BASE_OUTPUT_DIR") {
            self.output.base_dir = PathBuf::from(dir);
        }

        if let Some(count) = get("DEFAULT_NUM_VIDEOS") {
            self.source.episode_count = parse_env("DEFAULT_NUM_VIDEOS", &count)?;
        }

        if let Some(api_key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }

        if let Some(provider) = get("PODWISE_LLM_PROVIDER") {
            self.llm.provider = provider
                .parse::<LLMProvider>()
                .map_err(PodwiseError::Configuration)?;
        }

        if let Some(endpoint) = get("PODWISE_LLM_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }

        if let Some(model) = get("PODWISE_LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(chunk_size) = get("PODWISE_CHUNK_SIZE") {
            self.pipeline.chunk_size = parse_env("PODWISE_CHUNK_SIZE", &chunk_size)?;
        }

        if let Some(log_level) = get("PODWISE_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.source.channel_url.trim().is_empty() {
            problems.push("channel URL is not set (CHANNEL_URL)".to_string());
        }

        if self.source.episode_count == 0 {
            problems.push("episode count must be greater than 0".to_string());
        }

        if self.pipeline.chunk_size == 0 {
            problems.push("chunk_size must be greater than 0".to_string());
        }

        // LMStudio falls back to its local default endpoint
        if self.llm.provider == LLMProvider::OpenAI
            && self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            problems.push("API key required for the OpenAI provider (OPENAI_API_KEY)".to_string());
        }

        if !problems.is_empty() {
            return Err(PodwiseError::Configuration(problems.join("; ")));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Path of the ledger file
    pub fn ledger_path(&self) -> PathBuf {
        self.output.base_dir.join(&self.output.ledger_file)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Podwise Configuration:\n\
            - Channel: {}\n\
            - Episodes: {}\n\
            - Output Directory: {}\n\
            - LLM: {} ({})\n\
            - Chunk Size: {} chars\n\
            - Resume: {}",
            self.source.channel_url,
            self.source.episode_count,
            self.output.base_dir.display(),
            self.llm.provider,
            self.llm.model,
            self.pipeline.chunk_size,
            self.pipeline.resume
        )
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PodwiseError::Configuration(format!("{} has an invalid value: {}", key, value)))
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_channel_url(mut self, url: impl Into<String>) -> Self {
        self.config.source.channel_url = url.into();
        self
    }

    pub fn with_episode_count(mut self, count: usize) -> Self {
        self.config.source.episode_count = count;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.base_dir = dir.into();
        self
    }

    pub fn with_llm_provider(mut self, provider: LLMProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.llm.api_key = Some(api_key.into());
        self
    }

    pub fn with_llm_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.llm.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.pipeline.chunk_size = chunk_size;
        self
    }

    /// Disable both cooldowns
    pub fn without_cooldowns(mut self) -> Self {
        self.config.pipeline.llm_cooldown_ms = 0;
        self.config.pipeline.transcript_cooldown_ms = 0;
        self
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.config.pipeline.resume = resume;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.episode_count, 5);
        assert_eq!(config.pipeline.chunk_size, 8000);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.ledger_path(), PathBuf::from("./output/episodes.csv"));
        assert!(!config.pipeline.resume);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_channel_url("https://www.youtube.com/@example")
            .with_episode_count(3)
            .with_chunk_size(100)
            .without_cooldowns()
            .build();

        assert_eq!(config.source.episode_count, 3);
        assert_eq!(config.pipeline.chunk_size, 100);
        assert_eq!(config.pipeline.llm_cooldown_ms, 0);
        assert_eq!(config.pipeline.transcript_cooldown_ms, 0);
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("CHANNEL_URL", "https://www.youtube.com/@example"),
            ("BASE_OUTPUT_DIR", "/tmp/podwise"),
            ("DEFAULT_NUM_VIDEOS", "12"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PODWISE_CHUNK_SIZE", "4000"),
            ("PODWISE_LOG_LEVEL", ""),
        ]);

        let mut config = Config::default();
        config.apply_env_with(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.source.channel_url, "https://www.youtube.com/@example");
        assert_eq!(config.output.base_dir, PathBuf::from("/tmp/podwise"));
        assert_eq!(config.source.episode_count, 12);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.pipeline.chunk_size, 4000);
        assert_eq!(config.output.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_value() {
        let vars = env(&[("DEFAULT_NUM_VIDEOS", "five")]);
        let mut config = Config::default();
        let err = config.apply_env_with(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, PodwiseError::Configuration(_)));

        let vars = env(&[("PODWISE_LLM_PROVIDER", "gemini")]);
        assert!(config.apply_env_with(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_validation_lists_every_problem() {
        let config = ConfigBuilder::new().with_episode_count(0).build();
        let message = config.validate().unwrap_err().to_string();

        assert!(message.contains("channel URL"));
        assert!(message.contains("episode count"));
        assert!(message.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_lmstudio_uses_default_endpoint() {
        let config = ConfigBuilder::new()
            .with_channel_url("https://www.youtube.com/@example")
            .with_llm_provider(LLMProvider::LMStudio)
            .build();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.resolved_endpoint(), "http://localhost:1234/v1/chat/completions");

        let config = ConfigBuilder::new()
            .with_channel_url("https://www.youtube.com/@example")
            .with_llm_provider(LLMProvider::LMStudio)
            .with_llm_endpoint("http://localhost:1234/v1/chat/completions")
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("podwise.toml");
        std::fs::write(
            &path,
            "[source]\nchannel_url = \"https://www.youtube.com/@example\"\n\n[pipeline]\nresume = true\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.source.channel_url, "https://www.youtube.com/@example");
        assert_eq!(config.source.episode_count, 5);
        assert!(config.pipeline.resume);
        assert_eq!(config.pipeline.chunk_size, 8000);
    }

    #[test]
    fn test_toml_provider_names_are_lowercase() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("podwise.toml");
        std::fs::write(
            &path,
            "[source]\nchannel_url = \"https://www.youtube.com/@example\"\n\n[llm]\nprovider = \"lmstudio\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.llm.provider, LLMProvider::LMStudio);
        assert!(config.validate().is_ok());

        let written = toml::to_string(&config).unwrap();
        assert!(written.contains("provider = \"lmstudio\""));
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("podwise.toml");
        std::fs::write(&path, "[source\nchannel_url = ").unwrap();
        assert!(matches!(Config::from_file(&path), Err(PodwiseError::Toml(_))));
    }
}
