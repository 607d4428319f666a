//! MAL meta-provider CLI application.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mal_meta::{factory, HttpClient, MangaProvider};
use serde::Serialize;
use shared::{Config, LogConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch MAL info with the provider's episodes
    Info {
        /// MAL anime id
        id: String,

        /// Request dubbed episodes
        #[arg(long)]
        dub: bool,

        /// Flag filler episodes
        #[arg(long)]
        filler: bool,
    },

    /// Search MyAnimeList
    Search {
        query: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Stream sources for an episode
    Sources { episode_id: String },

    /// Mirror servers for an episode
    Servers { episode_id: String },

    /// Search the manga provider
    MangaSearch { query: String },

    /// Manga details and chapters
    MangaInfo { id: String },

    /// Page images of a chapter
    MangaPages { chapter_id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    shared::logging::init(LogConfig::from_config(&config, "mal-meta", args.verbose))?;

    info!(
        config_file = %args.config.display(),
        provider = %config.meta.provider,
        "MAL meta-provider starting"
    );

    match args.command {
        Command::Info { id, dub, filler } => {
            let meta = factory::build_default(&config).context("Failed to build meta-provider")?;
            let anime = meta
                .fetch_anime_info(&id, dub, filler)
                .await
                .with_context(|| format!("Failed to fetch anime {id}"))?;
            print_json(&anime)
        }
        Command::Search { query, page } => {
            let meta = factory::build_default(&config).context("Failed to build meta-provider")?;
            let results = meta.search(&query, page).await.context("Search failed")?;
            print_json(&results)
        }
        Command::Sources { episode_id } => {
            let meta = factory::build_default(&config).context("Failed to build meta-provider")?;
            let sources = meta
                .fetch_episode_sources(&episode_id)
                .await
                .with_context(|| format!("Failed to fetch sources for {episode_id}"))?;
            print_json(&sources)
        }
        Command::Servers { episode_id } => {
            let meta = factory::build_default(&config).context("Failed to build meta-provider")?;
            let servers = meta
                .fetch_episode_servers(&episode_id)
                .await
                .with_context(|| format!("Failed to fetch servers for {episode_id}"))?;
            print_json(&servers)
        }
        Command::MangaSearch { query } => {
            let manga = manga_provider(&config)?;
            let results = manga.search(&query).await.context("Manga search failed")?;
            print_json(&results)
        }
        Command::MangaInfo { id } => {
            let manga = manga_provider(&config)?;
            let info = manga
                .fetch_manga_info(&id)
                .await
                .with_context(|| format!("Failed to fetch manga {id}"))?;
            print_json(&info)
        }
        Command::MangaPages { chapter_id } => {
            let manga = manga_provider(&config)?;
            let pages = manga
                .fetch_chapter_pages(&chapter_id)
                .await
                .with_context(|| format!("Failed to fetch pages for {chapter_id}"))?;
            print_json(&pages)
        }
    }
}

fn manga_provider(config: &Config) -> Result<Arc<dyn MangaProvider>> {
    let http = HttpClient::from_config(&config.http).context("Failed to create HTTP client")?;
    factory::manga_provider(&config.meta.manga_provider, &http, config)
        .context("Failed to create manga provider")
}
