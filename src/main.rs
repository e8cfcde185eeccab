use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use podwise_rust::{Config, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Podwise (Rust)")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract books, product recommendations and Q&A summaries from recent podcast episodes")
        .arg(
            Arg::new("channel")
                .short('c')
                .long("channel")
                .value_name("URL")
                .help("Channel URL to discover episodes from (overrides CHANNEL_URL)")
        )
        .arg(
            Arg::new("count")
                .short('n')
                .long("count")
                .value_name("NUM")
                .help("Number of most recent episodes to process")
                .value_parser(clap::value_parser!(usize))
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for the ledger, transcripts and summaries")
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to podwise.toml or config/podwise.toml)")
        )
        .arg(
            Arg::new("resume")
                .long("resume")
                .help("Keep progress from the existing ledger instead of starting over")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;

    if let Some(channel) = matches.get_one::<String>("channel") {
        config.source.channel_url = channel.clone();
    }
    if let Some(count) = matches.get_one::<usize>("count") {
        config.source.episode_count = *count;
    }
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.base_dir = PathBuf::from(dir);
    }
    if matches.get_flag("resume") {
        config.pipeline.resume = true;
    }

    let verbose = matches.get_flag("verbose");
    init_tracing(&config, verbose);

    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e.into());
    }

    info!("🚀 Podwise starting...");
    info!("{}", config.summary());
    info!(
        "Podwise will now process the last {} episodes of {}",
        config.source.episode_count, config.source.channel_url
    );

    let pipeline = Pipeline::from_config(&config)?;

    match pipeline.process_all().await {
        Ok(report) => {
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline execution failed: {}", e);
            Err(e.into())
        }
    }
}

fn init_tracing(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("podwise_rust=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if config.output.log_level == "info" {
                EnvFilter::new("podwise_rust=info,warn")
            } else {
                EnvFilter::new(format!("podwise_rust={},warn", config.output.log_level))
            }
        })
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
