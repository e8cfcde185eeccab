use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::episode::{Book, DiscoveredEpisode, Episode, EpisodeState, Product};
use crate::error::{PodwiseError, Result};

/// Column order of the ledger file
pub const LEDGER_COLUMNS: [&str; 8] = [
    "title",
    "external_id",
    "book_titles",
    "book_authors",
    "product_recommendations",
    "summary_file",
    "has_transcript",
    "state",
];

const LIST_SEPARATOR: &str = "; ";

/// Persisted form of an episode. List-of-pairs fields are semicolon-joined
/// strings here and typed everywhere else.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    title: String,
    #[serde(alias = "video_id")]
    external_id: String,
    #[serde(default)]
    book_titles: String,
    #[serde(default)]
    book_authors: String,
    #[serde(default)]
    product_recommendations: String,
    #[serde(default)]
    summary_file: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    has_transcript: bool,
    #[serde(default)]
    state: Option<EpisodeState>,
}

impl LedgerRow {
    fn from_episode(episode: &Episode) -> Self {
        Self {
            title: episode.title.clone(),
            external_id: episode.external_id.clone(),
            book_titles: join(episode.books.iter().map(|b| b.title.as_str())),
            book_authors: join(episode.books.iter().map(|b| b.author.as_str())),
            product_recommendations: join(episode.products.iter().map(|p| p.to_string())),
            summary_file: episode.summary_file.clone().unwrap_or_default(),
            has_transcript: episode.has_transcript(),
            state: Some(episode.state),
        }
    }

    fn into_episode(self) -> Episode {
        let books = parse_books(&self.book_titles, &self.book_authors);
        let products = parse_products(&self.product_recommendations);
        let summary_file = Some(self.summary_file.trim().to_string()).filter(|s| !s.is_empty());

        // Legacy ledgers carry no state column; infer it from field presence
        let state = self.state.unwrap_or_else(|| {
            if !self.has_transcript {
                EpisodeState::Discovered
            } else if !books.is_empty() || !products.is_empty() || summary_file.is_some() {
                EpisodeState::Analyzed
            } else {
                EpisodeState::Transcribed
            }
        });

        Episode {
            title: self.title,
            external_id: self.external_id,
            state,
            books,
            products,
            summary_file,
        }
    }
}

/// Join list items with `"; "`. A `;` inside an item would split it on
/// reload, so it is written as `,`.
fn join<S: AsRef<str>>(items: impl Iterator<Item = S>) -> String {
    items
        .map(|s| s.as_ref().replace(';', ","))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn split_list(field: &str) -> Vec<&str> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_books(titles: &str, authors: &str) -> Vec<Book> {
    let titles: Vec<&str> = titles.split(';').map(str::trim).collect();
    let authors: Vec<&str> = authors.split(';').map(str::trim).collect();
    let len = titles.len().max(authors.len());

    (0..len)
        .map(|i| {
            Book::new(
                titles.get(i).copied().unwrap_or_default(),
                authors.get(i).copied().unwrap_or_default(),
            )
        })
        .filter(|b| !b.title.is_empty() || !b.author.is_empty())
        .collect()
}

fn parse_products(field: &str) -> Vec<Product> {
    split_list(field)
        .into_iter()
        .map(|entry| match entry.split_once(" - ") {
            Some((name, description)) => Product::new(name.trim(), description.trim()),
            None => Product::new(entry, ""),
        })
        .collect()
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid has_transcript value: {}",
            other
        ))),
    }
}

/// Row-per-episode ledger persisted as CSV
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load every row in file order
    pub fn load(&self) -> Result<Vec<Episode>> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            PodwiseError::Ledger(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        let mut episodes = Vec::new();
        for (i, row) in reader.deserialize::<LedgerRow>().enumerate() {
            let row = row.map_err(|e| {
                PodwiseError::Ledger(format!(
                    "malformed row {} in {}: {}",
                    i + 1,
                    self.path.display(),
                    e
                ))
            })?;
            episodes.push(row.into_episode());
        }

        debug!("📒 Loaded {} ledger rows from {}", episodes.len(), self.path.display());
        Ok(episodes)
    }

    /// Overwrite the ledger with `episodes`. The file is written to a temporary
    /// sibling and renamed over the previous version.
    pub fn save(&self, episodes: &[Episode]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            writer.write_record(LEDGER_COLUMNS)?;
            for episode in episodes {
                writer.serialize(LedgerRow::from_episode(episode))?;
            }
            writer.flush()?;
        }

        tmp.persist(&self.path).map_err(|e| {
            PodwiseError::Ledger(format!("cannot replace {}: {}", self.path.display(), e.error))
        })?;

        debug!("💾 Saved {} ledger rows to {}", episodes.len(), self.path.display());
        Ok(())
    }

    /// Replace the ledger with fresh `Discovered` rows. Duplicate ids keep
    /// their first occurrence.
    pub fn seed(&self, discovered: Vec<DiscoveredEpisode>) -> Result<Vec<Episode>> {
        let episodes = unique_by_id(discovered)
            .into_iter()
            .map(Episode::from)
            .collect::<Vec<_>>();

        self.save(&episodes)?;
        info!("📒 Ledger seeded with {} episodes", episodes.len());
        Ok(episodes)
    }

    /// Like `seed`, but rows already present in the ledger keep their state
    /// and results. Ids no longer discovered are dropped.
    pub fn seed_preserving(&self, discovered: Vec<DiscoveredEpisode>) -> Result<Vec<Episode>> {
        let mut existing: HashMap<String, Episode> = if self.exists() {
            self.load()?
                .into_iter()
                .map(|e| (e.external_id.clone(), e))
                .collect()
        } else {
            HashMap::new()
        };

        let mut carried = 0;
        let episodes = unique_by_id(discovered)
            .into_iter()
            .map(|d| match existing.remove(&d.external_id) {
                Some(previous) => {
                    carried += 1;
                    previous
                }
                None => Episode::from(d),
            })
            .collect::<Vec<_>>();

        self.save(&episodes)?;
        info!(
            "📒 Ledger seeded with {} episodes ({} carried over from previous run)",
            episodes.len(),
            carried
        );
        Ok(episodes)
    }
}

fn unique_by_id(discovered: Vec<DiscoveredEpisode>) -> Vec<DiscoveredEpisode> {
    let mut seen = HashSet::new();
    discovered
        .into_iter()
        .filter(|d| {
            let fresh = seen.insert(d.external_id.clone());
            if !fresh {
                warn!("Duplicate episode id '{}' dropped: {}", d.external_id, d.title);
            }
            fresh
        })
        .collect()
}
