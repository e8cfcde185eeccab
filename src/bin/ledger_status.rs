use anyhow::Result;
use clap::Parser;
use podwise_rust::{Config, EpisodeState, LedgerStore};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ledger-status")]
#[command(about = "Show the processing state of every episode in the ledger")]
struct Cli {
    /// Ledger file (defaults to the configured ledger)
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only list episodes in this state (e.g. "transcript_unavailable")
    #[arg(long)]
    state: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();

    let ledger_path = match cli.ledger {
        Some(path) => path,
        None => {
            let mut config = match &cli.config {
                Some(path) => Config::from_file(path)?,
                None => Config::load()?,
            };
            config.apply_env()?;
            config.ledger_path()
        }
    };

    let filter = match cli.state.as_deref() {
        Some(name) => Some(
            EpisodeState::ALL
                .into_iter()
                .find(|s| s.as_str() == name)
                .ok_or_else(|| anyhow::anyhow!("unknown state: {}", name))?,
        ),
        None => None,
    };

    let ledger = LedgerStore::new(&ledger_path);
    if !ledger.exists() {
        info!("📭 No ledger found at {}", ledger_path.display());
        return Ok(());
    }

    let episodes = ledger.load()?;
    info!("📒 {} episodes in {}", episodes.len(), ledger_path.display());

    for (index, episode) in episodes.iter().enumerate() {
        if filter.map_or(false, |state| episode.state != state) {
            continue;
        }
        println!(
            "{:>3}. [{:<22}] {} ({})",
            index + 1,
            episode.state.as_str(),
            episode.title,
            episode.external_id
        );
    }

    println!();
    for state in EpisodeState::ALL {
        let count = episodes.iter().filter(|e| e.state == state).count();
        println!("{:<22} {}", state.as_str(), count);
    }

    Ok(())
}
